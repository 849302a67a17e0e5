//! Document processing pipeline
//!
//! Ties the pieces together: download a statement from Drive, turn it
//! into page images, run the vision model, repair the output into the
//! fixed CSV schema, and publish the CSV back to Drive.
//!
//! Error policy differs by operation. `identify` propagates failures so
//! callers can surface them; `extract` never fails, it folds any error
//! into a structured outcome with `success == false`. Folder processing
//! isolates per-file failures so one bad scan cannot sink the batch.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::ai::{retry_with_backoff, ModelClient, VisionBackend};
use crate::convert;
use crate::csv_output;
use crate::error::{Error, Result};
use crate::models::{DocumentKind, ExtractionOutcome, Identification};
use crate::prompts::{extraction_key, PromptStore, IDENTIFY_PROMPT};
use crate::settings::Settings;
use crate::store::{FileStore, StoreClient, StoredDocument};

/// Banks with a bank-statement extraction prompt
pub const BANK_STATEMENT_BANKS: [&str; 2] = ["picpay", "itau"];
/// Banks with a credit-card extraction prompt
pub const CREDIT_CARD_BANKS: [&str; 3] = ["picpay", "itau", "xp"];

/// Summary of a bulk folder run
#[derive(Debug, Clone, Serialize)]
pub struct FolderSummary {
    pub message: String,
    pub total_files: usize,
    pub processed_files: Vec<ProcessedFile>,
    pub failed_files: Vec<FailedFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub file_id: String,
    pub file_name: String,
    pub bank: String,
    pub document_type: String,
    pub csv_file_id: Option<String>,
    pub csv_file_url: Option<String>,
    pub transactions_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file_id: String,
    pub file_name: String,
    pub error: String,
}

#[derive(Clone)]
pub struct Pipeline {
    model: ModelClient,
    store: StoreClient,
    prompts: Arc<PromptStore>,
    settings: Arc<Settings>,
}

impl Pipeline {
    pub fn new(
        model: ModelClient,
        store: StoreClient,
        prompts: Arc<PromptStore>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            model,
            store,
            prompts,
            settings,
        }
    }

    /// Check that a bank/document pair has an extraction prompt
    pub fn route(bank: &str, kind: DocumentKind) -> Result<()> {
        let bank = bank.to_lowercase();
        match kind {
            DocumentKind::BankStatement => {
                if BANK_STATEMENT_BANKS.contains(&bank.as_str()) {
                    Ok(())
                } else {
                    Err(Error::UnsupportedBank(format!(
                        "No bank statement support for '{}'; supported: {}",
                        bank,
                        BANK_STATEMENT_BANKS.join(", ")
                    )))
                }
            }
            DocumentKind::CreditCard => {
                if CREDIT_CARD_BANKS.contains(&bank.as_str()) {
                    Ok(())
                } else {
                    Err(Error::UnsupportedBank(format!(
                        "No credit card support for '{}'; supported: {}",
                        bank,
                        CREDIT_CARD_BANKS.join(", ")
                    )))
                }
            }
            DocumentKind::Unknown => Err(Error::UnsupportedDocument(
                "Could not determine document type".into(),
            )),
        }
    }

    async fn fetch_document(&self, file_id: &str) -> Result<StoredDocument> {
        let store = self.store.clone();
        let file_id = file_id.to_string();
        retry_with_backoff(
            self.settings.llm.max_retries,
            self.settings.llm.retry_delay,
            "Drive download",
            || {
                let store = store.clone();
                let file_id = file_id.clone();
                async move { store.download(&file_id).await }
            },
        )
        .await
    }

    async fn run_model(&self, images: &[Vec<u8>], instruction: &str) -> Result<String> {
        retry_with_backoff(
            self.settings.llm.max_retries,
            self.settings.llm.retry_delay,
            "Model inference",
            || {
                self.model
                    .analyze(images, instruction, self.settings.llm.max_tokens)
            },
        )
        .await
    }

    /// Classify a document: which bank, which document type
    ///
    /// Transport and conversion failures propagate. An unparseable model
    /// response is not a failure; it degrades to the unknown
    /// classification.
    pub async fn identify(&self, file_id: &str) -> Result<Identification> {
        let document = self.fetch_document(file_id).await?;
        let mut images =
            convert::to_page_images(&document.bytes, self.settings.processing.pdf_dpi)?;
        // The first page is enough to tell bank and document type
        images.truncate(1);
        let prompt = self.prompts.get(IDENTIFY_PROMPT)?;

        let response = self.run_model(&images, &prompt).await?;
        let identification = parse_identification(&response);
        info!(
            file_id,
            bank = %identification.bank,
            document_type = %identification.document_type,
            confidence = identification.confidence,
            "Identified document"
        );
        Ok(identification)
    }

    /// Extract transactions from a document of a known bank and type
    ///
    /// Never returns an error; failures come back as an outcome with
    /// `success == false` and the error text attached.
    pub async fn extract(
        &self,
        file_id: &str,
        bank: &str,
        kind: DocumentKind,
        output_filename: Option<&str>,
    ) -> ExtractionOutcome {
        let started = Instant::now();
        match self.extract_inner(file_id, bank, kind, output_filename).await {
            Ok(mut outcome) => {
                outcome.processing_time_seconds = Some(started.elapsed().as_secs_f64());
                outcome
            }
            Err(e) => {
                warn!(file_id, bank, "Extraction failed: {}", e);
                ExtractionOutcome::failure(
                    format!("Failed to process {} {}", bank, kind.label()),
                    e.to_string(),
                )
            }
        }
    }

    async fn extract_inner(
        &self,
        file_id: &str,
        bank: &str,
        kind: DocumentKind,
        output_filename: Option<&str>,
    ) -> Result<ExtractionOutcome> {
        Self::route(bank, kind)?;

        let document = self.fetch_document(file_id).await?;
        let images = convert::to_page_images(&document.bytes, self.settings.processing.pdf_dpi)?;
        let prompt = self.prompts.get(&extraction_key(bank, kind.as_str()))?;

        let response = self.run_model(&images, &prompt).await?;
        let csv = csv_output::from_model_response(&response);
        let count = csv_output::transaction_count(&csv);

        let filename = match output_filename {
            Some(name) => name.to_string(),
            None => csv_output::output_filename(bank, kind.as_str(), Some(&document.name)),
        };
        let store = self.store.clone();
        let output_folder = self.settings.drive.output_folder_id.clone();
        let uploaded = retry_with_backoff(
            self.settings.llm.max_retries,
            self.settings.llm.retry_delay,
            "Drive upload",
            || {
                let store = store.clone();
                let filename = filename.clone();
                let csv = csv.clone();
                let folder = output_folder.clone();
                async move { store.upload_csv(&filename, &csv, folder.as_deref()).await }
            },
        )
        .await?;

        info!(
            file_id,
            bank,
            document_type = %kind,
            transactions = count,
            csv_file_id = %uploaded.id,
            "Extraction complete"
        );
        Ok(ExtractionOutcome {
            success: true,
            message: format!("Successfully processed {} {}", bank, kind.label()),
            csv_file_id: Some(uploaded.id),
            csv_file_url: Some(uploaded.url),
            transactions_count: Some(count),
            processing_time_seconds: None,
            error: None,
        })
    }

    /// Identify a document, then extract with the detected bank and type
    pub async fn process_file(&self, file_id: &str) -> Result<(Identification, ExtractionOutcome)> {
        let identification = self.identify(file_id).await?;
        Self::route(&identification.bank, identification.document_type)?;
        let outcome = self
            .extract(
                file_id,
                &identification.bank,
                identification.document_type,
                None,
            )
            .await;
        Ok((identification, outcome))
    }

    /// Process every file in the configured input folder
    ///
    /// Files are handled independently; a failure lands in
    /// `failed_files` and the run continues. Unsupported formats are
    /// reported there too rather than dropped from the summary.
    pub async fn process_folder(&self) -> Result<FolderSummary> {
        let folder_id = self
            .settings
            .drive
            .input_folder_id
            .as_deref()
            .ok_or_else(|| Error::Config("Input folder is not configured".into()))?;

        let entries = self.store.list_folder(folder_id).await?;

        let mut processed_files = Vec::new();
        let mut failed_files = Vec::new();

        for file in &entries {
            if !self.settings.is_supported_format(&file.name) {
                failed_files.push(FailedFile {
                    file_id: file.id.clone(),
                    file_name: file.name.clone(),
                    error: format!("Unsupported file format: {}", file.name),
                });
                continue;
            }
            match self.process_file(&file.id).await {
                Ok((identification, outcome)) if outcome.success => {
                    processed_files.push(ProcessedFile {
                        file_id: file.id.clone(),
                        file_name: file.name.clone(),
                        bank: identification.bank,
                        document_type: identification.document_type.as_str().to_string(),
                        csv_file_id: outcome.csv_file_id,
                        csv_file_url: outcome.csv_file_url,
                        transactions_count: outcome.transactions_count,
                    });
                }
                Ok((_, outcome)) => {
                    failed_files.push(FailedFile {
                        file_id: file.id.clone(),
                        file_name: file.name.clone(),
                        error: outcome
                            .error
                            .unwrap_or_else(|| outcome.message.clone()),
                    });
                }
                Err(e) => {
                    warn!(file_id = %file.id, file_name = %file.name, "Skipping file: {}", e);
                    failed_files.push(FailedFile {
                        file_id: file.id.clone(),
                        file_name: file.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = FolderSummary {
            message: format!(
                "Processed {} of {} files",
                processed_files.len(),
                entries.len()
            ),
            total_files: entries.len(),
            processed_files,
            failed_files,
        };
        info!(
            total = summary.total_files,
            processed = summary.processed_files.len(),
            failed = summary.failed_files.len(),
            "Folder run complete"
        );
        Ok(summary)
    }
}

/// Pull the identification JSON out of a model response
///
/// Models wrap JSON in prose or code fences often enough that a plain
/// parse is not sufficient; scan for the outermost brace pair instead.
/// Anything unparseable degrades to the unknown classification.
fn parse_identification(response: &str) -> Identification {
    let start = response.find('{');
    let end = response.rfind('}');
    let candidate = match (start, end) {
        (Some(s), Some(e)) if e > s => &response[s..=e],
        _ => {
            warn!("No JSON object in identification response");
            return Identification::unknown();
        }
    };
    match serde_json::from_str::<Identification>(candidate) {
        Ok(mut identification) => {
            identification.bank = identification.bank.to_lowercase();
            identification
        }
        Err(e) => {
            warn!("Unparseable identification response: {}", e);
            Identification::unknown()
        }
    }
}
