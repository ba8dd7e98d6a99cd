//! Bill commands: scan a photo, add by hand, list, show.

use std::path::Path;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::cli::args::{BillAddArgs, BillCommand, BillScanArgs, ListArgs};
use crate::cli::print_output;
use crate::core::models::{BillAnalysisInput, BillAnalysisRecord};
use crate::core::pipeline::{ExtractionOutcome, ExtractionPipeline};
use crate::error::{FlowError, Result};
use crate::render;
use crate::storage::config::{MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
use crate::storage::{RecordStore, ResolvedConfig};

/// Execute bill subcommands.
///
/// # Errors
/// Returns an error if the arguments are invalid, the record database cannot
/// be opened, or the requested record does not exist. Extraction failures are
/// not errors: they yield default values.
pub async fn execute(cmd: &BillCommand, config: &ResolvedConfig) -> Result<()> {
    let output = match cmd {
        BillCommand::Scan(args) => {
            let timeout = scan_timeout(args, config)?;
            validate_image(&args.image)?;

            let store = if args.no_save {
                None
            } else {
                Some(RecordStore::open(&config.database_path)?)
            };
            let pipeline = ExtractionPipeline::from_config(&config.extraction);
            let today = Local::now().date_naive();

            let (outcome, record) =
                scan(&pipeline, store.as_ref(), &args.image, today, timeout).await?;
            render::render_scan(
                &outcome,
                record.as_ref(),
                config.format,
                config.pretty,
                config.no_color,
            )?
        }
        BillCommand::Add(args) => {
            args.validate()?;
            let store = RecordStore::open(&config.database_path)?;
            let record = add(&store, args)?;
            render::render_bill(
                "bill add",
                &record,
                config.format,
                config.pretty,
                config.no_color,
            )?
        }
        BillCommand::List(args) => {
            args.validate()?;
            let store = RecordStore::open(&config.database_path)?;
            let records = list(&store, args)?;
            render::render_bills(&records, config.format, config.pretty, config.no_color)?
        }
        BillCommand::Show { id } => {
            let store = RecordStore::open(&config.database_path)?;
            let record = store.get_bill_analysis(*id)?;
            render::render_bill(
                "bill show",
                &record,
                config.format,
                config.pretty,
                config.no_color,
            )?
        }
    };

    print_output(&output);
    Ok(())
}

/// Run the pipeline on one image and store the result when a store is given.
///
/// # Errors
/// Returns an error only if storing the result fails.
pub async fn scan(
    pipeline: &ExtractionPipeline,
    store: Option<&RecordStore>,
    image: &Path,
    today: NaiveDate,
    timeout: Duration,
) -> Result<(ExtractionOutcome, Option<BillAnalysisRecord>)> {
    let outcome = pipeline.extract_with_timeout(image, today, timeout).await;

    let record = match store {
        Some(store) => {
            if outcome.used_defaults() {
                tracing::warn!(
                    strategy = outcome.strategy,
                    "Storing a bill made of default values"
                );
            }
            let input = BillAnalysisInput::from_extraction(
                &outcome.result,
                Some(image.display().to_string()),
            );
            Some(store.record_bill_analysis(&input)?)
        }
        None => None,
    };

    Ok((outcome, record))
}

/// Store a bill entered by hand.
///
/// # Errors
/// Returns an error if the INSERT fails.
pub fn add(store: &RecordStore, args: &BillAddArgs) -> Result<BillAnalysisRecord> {
    let record = store.record_bill_analysis(&args.to_input())?;
    tracing::info!(id = record.id, usage = record.usage, "Bill recorded");
    Ok(record)
}

/// Newest-first bill analyses.
///
/// # Errors
/// Returns an error if the query fails.
pub fn list(store: &RecordStore, args: &ListArgs) -> Result<Vec<BillAnalysisRecord>> {
    store.list_bill_analyses(args.limit)
}

fn scan_timeout(args: &BillScanArgs, config: &ResolvedConfig) -> Result<Duration> {
    match args.timeout {
        None => Ok(config.timeout),
        Some(seconds) if (MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&seconds) => {
            Ok(Duration::from_secs(seconds))
        }
        Some(seconds) => Err(FlowError::invalid_input(
            "timeout",
            format!("must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS} seconds, got {seconds}"),
        )),
    }
}

fn validate_image(image: &Path) -> Result<()> {
    if image.is_file() {
        Ok(())
    } else {
        Err(FlowError::invalid_input(
            "image",
            format!("{} is not a readable file", image.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::ExtractionStrategy;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[tokio::test]
    async fn scan_without_strategy_stores_defaults() {
        let store = RecordStore::open_in_memory().unwrap();
        let pipeline = ExtractionPipeline::new(ExtractionStrategy::None);

        let (outcome, record) = scan(
            &pipeline,
            Some(&store),
            Path::new("bill.jpg"),
            today(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(outcome.strategy, "none");
        let record = record.unwrap();
        assert_eq!(record.period_start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(record.period_end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(record.photo_path.as_deref(), Some("bill.jpg"));
    }

    #[tokio::test]
    async fn no_store_means_no_record() {
        let pipeline = ExtractionPipeline::new(ExtractionStrategy::None);
        let (_, record) = scan(
            &pipeline,
            None,
            Path::new("bill.jpg"),
            today(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn missing_image_is_invalid_input() {
        let err = validate_image(Path::new("/nonexistent/flowsense/bill.jpg")).unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput { .. }));
    }

    #[test]
    fn manual_bill_is_stored() {
        let store = RecordStore::open_in_memory().unwrap();
        let args = BillAddArgs {
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            usage: 4200.0,
            amount: 61.25,
            photo: None,
        };
        let record = add(&store, &args).unwrap();
        assert_eq!(list(&store, &ListArgs { limit: 10 }).unwrap(), vec![record]);
    }
}
