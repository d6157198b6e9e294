use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

use build_html::Html;
use log::info;
use num_format::{Locale, ToFormattedString};
use plotly::{
    common::{Mode, Title},
    layout::Axis,
    Layout, Plot, Scatter,
};

use super::fatalities_archive::FatalityRecord;

const TITLE: &str = "Gaza: Reported Palestinian fatalities (cumulative)";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";
const DIV_ID: &str = "ocha-fatalities";

pub struct FatalitiesChartPage {
    pub docs_dir: PathBuf,
}

impl FatalitiesChartPage {
    pub fn filename(&self) -> PathBuf {
        self.docs_dir.join("index.html")
    }

    /// Regenerate the page.  Return `true` if the file content changed.
    pub fn update(&self, rows: &[FatalityRecord]) -> Result<bool, Box<dyn Error>> {
        let html = render_page(rows);
        let changed = write_if_changed(&self.filename(), &html)?;
        if changed {
            info!("Chart page {:?} updated", self.filename());
        } else {
            info!("Chart page {:?} is up to date", self.filename());
        }
        Ok(changed)
    }
}

fn chart(rows: &[FatalityRecord]) -> Plot {
    let trace = Scatter::new(
        rows.iter().map(|r| r.date.to_string()).collect::<Vec<_>>(),
        rows.iter().map(|r| r.fatalities).collect::<Vec<_>>(),
    )
    .mode(Mode::LinesMarkers)
    .name("Fatalities");

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .title(Title::with_text(TITLE))
            .y_axis(Axis::new().title(Title::with_text("Fatalities")))
            .width(900)
            .height(400),
    );
    plot
}

fn table(rows: &[FatalityRecord]) -> build_html::Table {
    let mut table = build_html::Table::new();
    table.add_header_row(vec!["Snapshot date", "Fatalities"]);
    for row in rows.iter().rev() {
        table.add_body_row(vec![
            row.date.to_string(),
            row.fatalities.to_formatted_string(&Locale::en),
        ]);
    }
    table
}

/// The same rows always render to the same page.
pub fn render_page(rows: &[FatalityRecord]) -> String {
    let latest = match rows.last() {
        Some(r) => format!(
            "{} reported fatalities as of {}.",
            r.fatalities.to_formatted_string(&Locale::en),
            r.date
        ),
        None => "No snapshot has been archived yet.".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="utf-8">
        <title>{title}</title>
        <script src="{plotly_js}"></script>
        <style>
            table {{
                border-collapse: collapse;
            }}
            th, td {{
                border: 1px solid #d8dee9;
                padding: 4px 8px;
                text-align: right;
            }}
        </style>
    </head>
    <body>
        <h2>{title}</h2>
        <p>{latest}</p>
        {chart}
        <p>Source: OCHA, Reported impact snapshot | Gaza Strip.</p>
        {table}
    </body>
</html>
"#,
        title = TITLE,
        plotly_js = PLOTLY_JS,
        latest = latest,
        chart = chart(rows).to_inline_html(Some(DIV_ID)),
        table = table(rows).to_html_string(),
    )
}

fn write_if_changed(path: &Path, content: &str) -> Result<bool, Box<dyn Error>> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, content)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use std::error::Error;

    fn rows() -> Vec<FatalityRecord> {
        vec![
            FatalityRecord {
                date: date(2025, 4, 30),
                fatalities: 52365,
            },
            FatalityRecord {
                date: date(2025, 5, 7),
                fatalities: 52615,
            },
        ]
    }

    #[test]
    fn render_is_deterministic() {
        assert_eq!(render_page(&rows()), render_page(&rows()));
    }

    #[test]
    fn render_content() {
        let html = render_page(&rows());
        assert!(html.contains("52,615 reported fatalities as of 2025-05-07."));
        assert!(html.contains(DIV_ID));
        assert!(html.contains("2025-04-30"));
        assert!(render_page(&[]).contains("No snapshot has been archived yet."));
    }

    #[test]
    fn update_only_writes_changes() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let page = FatalitiesChartPage {
            docs_dir: dir.path().join("docs"),
        };
        assert!(page.update(&rows())?);
        assert!(!page.update(&rows())?);
        assert!(page.update(&rows()[..1])?);
        Ok(())
    }
}
