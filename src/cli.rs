use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::helpers::allocator::AllocationConfig;
use crate::helpers::fields::SessionFieldMapping;
use crate::helpers::pdf::list_fields;
use crate::service::{TimesheetConfig, TimesheetService};

/// Fill a monthly timesheet PDF form from a table of weekly hours
#[derive(Parser, Debug)]
#[command(
    name = "autom-timesheet",
    version = env!("CARGO_PKG_VERSION"),
    about = "Fill a monthly timesheet PDF form from a table of weekly hours",
    long_about = None
)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(global = true, short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Allocate the weekly hours and write them into a PDF form
    Fill {
        #[command(flatten)]
        period: PeriodArgs,

        /// PDF form template
        #[arg(long)]
        template: PathBuf,

        /// Where to write the filled form
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the form values without touching any PDF
    Preview {
        #[command(flatten)]
        period: PeriodArgs,

        /// Print the values as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// List the fillable field names of a PDF form
    Fields {
        /// PDF form template
        #[arg(long)]
        template: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PeriodArgs {
    /// Year of the timesheet
    #[arg(long)]
    pub year: i32,

    /// Month of the timesheet (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: u32,

    /// CSV table with `h`, `m` and optional `Hours` / `label` columns, one row per week
    #[arg(short, long)]
    pub input: PathBuf,

    /// Activity label; repeat once per week, or give once for all weeks
    #[arg(long = "label")]
    pub labels: Vec<String>,

    /// Maximum hours of a single session
    #[arg(long, default_value_t = 4)]
    pub session_cap: u32,

    /// Maximum hours worked on one day
    #[arg(long, default_value_t = 8)]
    pub day_cap: u32,

    /// Start hour of the morning session
    #[arg(long, default_value_t = 8)]
    pub session1_start: u32,

    /// Start hour of the afternoon session
    #[arg(long, default_value_t = 14)]
    pub session2_start: u32,
}

impl PeriodArgs {
    pub fn to_config(&self) -> TimesheetConfig {
        let mut config = TimesheetConfig::new(self.year, self.month);
        config.labels = self.labels.clone();
        config.allocation = AllocationConfig {
            session_cap_hours: self.session_cap,
            day_cap_hours: self.day_cap,
            session1_start_hour: self.session1_start,
            session2_start_hour: self.session2_start,
        };
        config
    }
}

/// Formats the mapping as pretty JSON or as aligned `key = value` lines.
pub fn render_preview(mapping: &SessionFieldMapping, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(mapping)?);
    }

    let width = mapping.keys().map(|key| key.chars().count()).max().unwrap_or(0);
    let lines: Vec<String> = mapping
        .iter()
        .map(|(key, value)| format!("{:<width$} = {}", key, value, width = width))
        .collect();
    Ok(lines.join("\n"))
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fill {
            period,
            template,
            output,
        } => {
            let service = TimesheetService::new(period.to_config());
            let report = service
                .process_timesheet(&period.input, &template, &output)
                .with_context(|| format!("failed to fill {}", template.display()))?;

            for key in &report.unmatched_keys {
                info!("No form field named {:?}", key);
            }
            println!(
                "Wrote {} ({} fields filled)",
                output.display(),
                report.matched
            );
        }
        Commands::Preview { period, json } => {
            let service = TimesheetService::new(period.to_config());
            let mapping = service
                .preview(&period.input)
                .with_context(|| format!("failed to process {}", period.input.display()))?;

            println!("{}", render_preview(&mapping, json)?);
        }
        Commands::Fields { template } => {
            let names = list_fields(&template)
                .with_context(|| format!("failed to read {}", template.display()))?;
            for name in names {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_hours(dir: &tempfile::TempDir) -> PathBuf {
        let input = dir.path().join("hours.csv");
        fs::write(&input, "h,m,Hours,label\n5,30,5.5,IOR\n").unwrap();
        input
    }

    #[test]
    fn preview_renders_text_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_hours(&dir);

        let mapping = TimesheetService::new(TimesheetConfig::new(2024, 3))
            .preview(&input)
            .unwrap();

        let text = render_preview(&mapping, false).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), mapping.len());
        assert!(lines[0].starts_with("Tätigkeit Stichwort ProjektRow1 = IOR"));
        let duration_line = format!(
            "{:<width$} = 01:30",
            "hhmmRow2_4",
            width = "Tätigkeit Stichwort ProjektRow1".chars().count()
        );
        assert!(lines.contains(&duration_line.as_str()));
        assert!(lines.last().unwrap().ends_with("= 5h 30m"));

        let json: serde_json::Value =
            serde_json::from_str(&render_preview(&mapping, true).unwrap()).unwrap();
        assert_eq!(json["ttmmjjRow1"], "01.03.24");
        assert_eq!(json["hhmmRow2"], "14:00");
        assert_eq!(json["Summe"], "5h 30m");
    }

    #[test]
    fn run_preview_reads_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_hours(&dir);

        for extra in [None, Some("--json")] {
            let mut args = vec![
                "autom-timesheet".to_string(),
                "preview".to_string(),
                "--year".to_string(),
                "2024".to_string(),
                "--month".to_string(),
                "3".to_string(),
                "--input".to_string(),
                input.display().to_string(),
            ];
            args.extend(extra.map(str::to_string));
            run(Cli::try_parse_from(args).unwrap()).unwrap();
        }
    }

    #[test]
    fn run_reports_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");

        let cli = Cli::try_parse_from([
            "autom-timesheet",
            "preview",
            "--year",
            "2024",
            "--month",
            "3",
            "--input",
            missing.to_str().unwrap(),
        ])
        .unwrap();
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("failed to process"));

        let template = dir.path().join("missing.pdf");
        let cli = Cli::try_parse_from([
            "autom-timesheet",
            "fields",
            "--template",
            template.to_str().unwrap(),
        ])
        .unwrap();
        assert!(run(cli).is_err());
    }

    #[test]
    fn parses_fill_with_defaults() {
        let cli = Cli::try_parse_from([
            "autom-timesheet",
            "fill",
            "--year",
            "2024",
            "--month",
            "3",
            "--input",
            "hours.csv",
            "--template",
            "form.pdf",
            "-o",
            "out.pdf",
            "--label",
            "IOR",
        ])
        .unwrap();

        let Commands::Fill { period, output, .. } = cli.command else {
            panic!("expected fill command");
        };
        assert_eq!(output, PathBuf::from("out.pdf"));

        let config = period.to_config();
        assert_eq!((config.year, config.month), (2024, 3));
        assert_eq!(config.labels, vec!["IOR"]);
        assert_eq!(config.allocation, AllocationConfig::default());
    }

    #[test]
    fn rejects_out_of_range_month() {
        let result = Cli::try_parse_from([
            "autom-timesheet",
            "preview",
            "--year",
            "2024",
            "--month",
            "13",
            "--input",
            "hours.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_allocation_settings() {
        let cli = Cli::try_parse_from([
            "autom-timesheet",
            "-v",
            "preview",
            "--year",
            "2024",
            "--month",
            "5",
            "-i",
            "hours.csv",
            "--session-cap",
            "3",
            "--day-cap",
            "6",
            "--session1-start",
            "7",
            "--session2-start",
            "13",
            "--json",
        ])
        .unwrap();
        assert!(cli.verbose);

        let Commands::Preview { period, json } = cli.command else {
            panic!("expected preview command");
        };
        assert!(json);
        assert_eq!(
            period.to_config().allocation,
            AllocationConfig {
                session_cap_hours: 3,
                day_cap_hours: 6,
                session1_start_hour: 7,
                session2_start_hour: 13,
            }
        );
    }
}
