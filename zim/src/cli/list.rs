// zim/src/cli/list.rs
use clap::Args;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use zim_common::config::Config;
use zim_common::error::Result;
use zim_common::model::UninstallEntry;
use zim_core::LocalIntegration;

#[derive(Args, Debug)]
pub struct List {
    /// Also show the install location of each application
    #[arg(long)]
    pub paths: bool,
}

impl List {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let entries = LocalIntegration::new(config).entries()?;
        if entries.is_empty() {
            println!("{}", "No applications installed".yellow());
            return Ok(());
        }
        let count = entries.len();
        let table = build_table(&entries, self.paths);
        table.printstd();
        println!(
            "{}",
            format!("{count} application{} installed", if count == 1 { "" } else { "s" }).bold()
        );
        Ok(())
    }
}

fn build_table(entries: &[(String, UninstallEntry)], with_paths: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    let mut header = vec![
        Cell::new("Name").style_spec("b"),
        Cell::new("Version").style_spec("b"),
        Cell::new("Publisher").style_spec("b"),
        Cell::new("Installed").style_spec("b"),
        Cell::new("Size").style_spec("b"),
    ];
    if with_paths {
        header.push(Cell::new("Location").style_spec("b"));
    }
    table.add_row(Row::new(header));

    for (name, entry) in entries {
        let mut cells = vec![
            Cell::new(name).style_spec("Fb"),
            Cell::new(&entry.display_version),
            Cell::new(&entry.publisher),
            Cell::new(&format_date(&entry.install_date)),
            Cell::new(&format_size(entry.estimated_size_kb)),
        ];
        if with_paths {
            cells.push(Cell::new(&entry.install_location.display().to_string()));
        }
        table.add_row(Row::new(cells));
    }
    table
}

/// `20240131` becomes `2024-01-31`; anything else is shown as stored.
fn format_date(raw: &str) -> String {
    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..])
    } else {
        raw.to_string()
    }
}

fn format_size(kb: u64) -> String {
    if kb >= 1024 * 1024 {
        format!("{:.1} GB", kb as f64 / (1024.0 * 1024.0))
    } else if kb >= 1024 {
        format!("{:.1} MB", kb as f64 / 1024.0)
    } else {
        format!("{kb} KB")
    }
}
