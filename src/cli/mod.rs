use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{Rule37Service, UploadContext, UploadFile, UploadResult};
use crate::domain::{CalculationRun, DISCLAIMER, InterestStatus, RunId, format_amount};
use crate::io::ExcelExportStrategy;

/// Rule 37 - GST delayed-payment interest calculator
#[derive(Parser)]
#[command(name = "rule37")]
#[command(about = "Computes 180-day ITC reversal and interest from Tally/Busy ledger exports")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "rule37.db")]
    pub database: String,

    /// Tenant the stored runs belong to
    #[arg(short, long, global = true, default_value = "default")]
    pub tenant: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Upload ledger files and compute a new run
    Upload {
        /// Ledger workbook files (.xlsx)
        files: Vec<PathBuf>,

        /// Calculation date for still-unpaid purchases (YYYY-MM-DD)
        #[arg(long)]
        as_on_date: String,

        /// Recorded as the run's author
        #[arg(long)]
        created_by: Option<String>,
    },

    /// Stored run management commands
    #[command(subcommand)]
    Runs(RunCommands),

    /// Export a stored run as a workbook
    Export {
        /// Run ID
        id: String,

        /// Output path (defaults to the run's download filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RunCommands {
    /// List stored runs, newest first
    List {
        /// Maximum number of runs to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Number of runs to skip
        #[arg(long, default_value = "0")]
        offset: i64,
    },

    /// Show one run in detail
    Show {
        /// Run ID
        id: String,
    },

    /// Delete a run
    Delete {
        /// Run ID
        id: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                Rule37Service::init(&self.database).await?;
                println!("Initialized database at {}", self.database);
            }

            Commands::Upload {
                files,
                as_on_date,
                created_by,
            } => {
                let service = Rule37Service::connect(&self.database).await?;
                let as_on_date = parse_date(&as_on_date)?;
                run_upload_command(&service, &files, as_on_date, self.tenant, created_by).await?;
            }

            Commands::Runs(cmd) => {
                let service = Rule37Service::connect(&self.database).await?;
                run_runs_command(&service, &self.tenant, cmd).await?;
            }

            Commands::Export { id, output } => {
                let service = Rule37Service::connect(&self.database).await?;
                run_export_command(&service, &self.tenant, &id, output).await?;
            }
        }

        Ok(())
    }
}

async fn run_upload_command(
    service: &Rule37Service,
    files: &[PathBuf],
    as_on_date: NaiveDate,
    tenant: String,
    created_by: Option<String>,
) -> Result<()> {
    let mut batch = Vec::with_capacity(files.len());
    for path in files {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        batch.push(UploadFile { filename, bytes });
    }

    let ctx = UploadContext {
        tenant_id: tenant,
        created_by,
    };
    let result = service.upload(batch, as_on_date, &ctx).await?;
    print_upload_result(&result);
    Ok(())
}

fn print_upload_result(result: &UploadResult) {
    println!("Run {} ({})", result.run_id, result.filename);
    println!();
    println!("{:<32} {:>16} {:>16}", "LEDGER", "ITC REVERSAL", "INTEREST");
    println!("{}", "-".repeat(66));
    for ledger in &result.results {
        println!(
            "{:<32} {:>16} {:>16}",
            ledger.ledger_name,
            format_amount(ledger.summary.total_itc_reversal),
            format_amount(ledger.summary.total_interest)
        );
    }
    if result.has_errors() {
        println!();
        println!("Skipped files:");
        for error in &result.errors {
            println!("  {}: {}", error.filename, error.message);
        }
    }
}

async fn run_runs_command(service: &Rule37Service, tenant: &str, cmd: RunCommands) -> Result<()> {
    match cmd {
        RunCommands::List { limit, offset } => {
            let runs = service.list_runs(tenant, limit, offset).await?;
            if runs.is_empty() {
                println!("No stored runs.");
            } else {
                println!(
                    "{:<36} {:<28} {:<12} {:>14} {:>14}",
                    "ID", "FILENAME", "AS ON", "ITC REVERSAL", "INTEREST"
                );
                println!("{}", "-".repeat(108));
                for run in runs {
                    println!(
                        "{:<36} {:<28} {:<12} {:>14} {:>14}",
                        run.id,
                        run.filename,
                        run.as_on_date.to_string(),
                        format_amount(run.total_itc_reversal),
                        format_amount(run.total_interest)
                    );
                }
            }
        }

        RunCommands::Show { id } => {
            let run = service.get_run(parse_run_id(&id)?, tenant).await?;
            print_run(&run);
        }

        RunCommands::Delete { id } => {
            service.delete_run(parse_run_id(&id)?, tenant).await?;
            println!("Deleted run {}", id);
        }
    }
    Ok(())
}

fn print_run(run: &CalculationRun) {
    println!("Run: {}", run.id);
    println!("  Filename:      {}", run.filename);
    println!("  As on:         {}", run.as_on_date);
    println!("  Interest:      {}", format_amount(run.total_interest));
    println!("  ITC reversal:  {}", format_amount(run.total_itc_reversal));
    println!("  Created:       {}", run.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(created_by) = &run.created_by {
        println!("  Created by:    {}", created_by);
    }
    println!("  Expires:       {}", run.expires_at.format("%Y-%m-%d %H:%M:%S"));

    for ledger in &run.calculation_data {
        let summary = &ledger.summary;
        println!();
        println!(
            "Ledger: {} (interest {}, ITC reversal {})",
            ledger.ledger_name,
            format_amount(summary.total_interest),
            format_amount(summary.total_itc_reversal)
        );
        if summary.at_risk_count > 0 {
            println!(
                "  At risk: {} purchase(s) totalling {} within 30 days of the deadline",
                summary.at_risk_count,
                format_amount(summary.at_risk_amount)
            );
        }
        if summary.details.is_empty() {
            println!("  No purchases past the 180-day threshold.");
            continue;
        }
        println!(
            "  {:<24} {:<12} {:<12} {:>14} {:>6} {:>12} {:>10} {:<9} {:<9}",
            "SUPPLIER", "PURCHASE", "PAYMENT", "PRINCIPAL", "DELAY", "ITC", "INTEREST", "STATUS", "PERIOD"
        );
        for row in &summary.details {
            let payment = row
                .payment_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "Unpaid".to_string());
            let status = match row.status {
                InterestStatus::PaidLate => "Paid Late",
                InterestStatus::Unpaid => "Unpaid",
            };
            println!(
                "  {:<24} {:<12} {:<12} {:>14} {:>6} {:>12} {:>10} {:<9} {:<9}",
                row.supplier,
                row.purchase_date.to_string(),
                payment,
                format_amount(row.principal),
                row.delay_days,
                format_amount(row.itc_amount),
                format_amount(row.interest),
                status,
                row.reversal_period
            );
        }
    }

    println!();
    println!("Note: {}", DISCLAIMER);
}

async fn run_export_command(
    service: &Rule37Service,
    tenant: &str,
    id: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let export = service
        .export_run(parse_run_id(id)?, tenant, &ExcelExportStrategy)
        .await?;

    let path = output.unwrap_or_else(|| PathBuf::from(&export.filename));
    fs::write(&path, &export.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {} ({} bytes)", path.display(), export.bytes.len());
    Ok(())
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", input))
}

fn parse_run_id(input: &str) -> Result<RunId> {
    Uuid::parse_str(input).with_context(|| format!("Invalid run id '{}'", input))
}
