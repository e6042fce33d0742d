use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{file_stem, ChartConfig, RenderError};
use crate::engine::SimulationOutcome;

/// Builds a standalone Chart.js page for `data`.
pub fn build(data: &[u64], title: &str, config: &ChartConfig) -> String {
    let palette = config.theme.palette();
    let heading = format!("{} Population Growth", escape_html(title));
    let labels: Vec<String> = (0..data.len()).map(|year| year.to_string()).collect();
    let chart_title = serde_json::Value::String(format!("{title} Population Growth"))
        .to_string()
        .replace("</", "<\\/");
    let labels = serde_json::Value::from(labels);
    let values = serde_json::Value::from(data.to_vec());
    let body = if data.is_empty() {
        "<p>No data to display</p>\n".to_string()
    } else {
        format!(
            "<div style=\"width: 800px; height: 400px;\">\n\
             <canvas id=\"populationChart\"></canvas>\n\
             </div>\n\
             <script>\n\
             const ctx = document.getElementById('populationChart');\n\
             new Chart(ctx, {{\n\
             \x20 type: 'line',\n\
             \x20 data: {{\n\
             \x20   labels: {labels},\n\
             \x20   datasets: [{{\n\
             \x20     label: 'Population',\n\
             \x20     data: {values},\n\
             \x20     borderColor: '{line}',\n\
             \x20     backgroundColor: '{fill}',\n\
             \x20     fill: true,\n\
             \x20     tension: 0.3\n\
             \x20   }}]\n\
             \x20 }},\n\
             \x20 options: {{\n\
             \x20   responsive: true,\n\
             \x20   plugins: {{ title: {{ display: true, text: {chart_title}, color: '{text}' }} }},\n\
             \x20   scales: {{\n\
             \x20     y: {{ beginAtZero: true, title: {{ display: true, text: 'Population' }} }},\n\
             \x20     x: {{ title: {{ display: true, text: 'Year' }} }}\n\
             \x20   }}\n\
             \x20 }}\n\
             }});\n\
             </script>\n",
            line = palette.line,
            fill = palette.fill,
            text = palette.text,
        )
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <title>{heading}</title>\n\
         <script src=\"https://cdn.jsdelivr.net/npm/chart.js\"></script>\n\
         <style>body {{ font-family: Arial, sans-serif; margin: 20px; background: {bg}; color: {text}; }}</style>\n\
         </head>\n<body>\n\
         <h1>{heading}</h1>\n\
         {body}\
         </body>\n</html>\n",
        bg = palette.background,
        text = palette.text,
    )
}

/// Writes `<title>_chart.html` into `dir`. Empty histories produce no file.
pub fn write_chart(
    dir: impl AsRef<Path>,
    data: &[u64],
    title: &str,
    config: &ChartConfig,
) -> Result<Option<PathBuf>, RenderError> {
    if data.is_empty() {
        warn!(title, "no data to generate chart");
        return Ok(None);
    }
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_chart.html", file_stem(title)));
    fs::write(&path, build(data, title, config))?;
    info!(path = %path.display(), "chart written");
    Ok(Some(path))
}

/// Writes the chart for a finished run, titled with its species name.
pub fn write_outcome_chart(
    dir: impl AsRef<Path>,
    outcome: &SimulationOutcome,
    config: &ChartConfig,
) -> Result<Option<PathBuf>, RenderError> {
    write_chart(dir, &outcome.history, outcome.profile.name(), config)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Theme;
    use crate::species::SpeciesProfile;
    use tempfile::tempdir;

    #[test]
    fn embeds_history_and_labels() {
        let html = build(&[10, 12, 9], "House Mouse", &ChartConfig::default());
        assert!(html.contains("data: [10,12,9]"));
        assert!(html.contains("labels: [\"0\",\"1\",\"2\"]"));
        assert!(html.contains("<h1>House Mouse Population Growth</h1>"));
    }

    #[test]
    fn theme_drives_colours() {
        let config = ChartConfig {
            theme: Theme::Dark,
            ..ChartConfig::default()
        };
        let html = build(&[1, 2], "Rat", &config);
        assert!(html.contains("background: #222"));
        assert!(html.contains("borderColor: 'rgb(100, 200, 100)'"));
    }

    #[test]
    fn titles_are_escaped() {
        let html = build(&[1], "<b>'Rat'</b>", &ChartConfig::default());
        assert!(html.contains("<h1>&lt;b&gt;&#39;Rat&#39;&lt;/b&gt; Population Growth</h1>"));
        assert!(!html.contains("<b>'Rat'</b> Population"));
    }

    #[test]
    fn empty_history_builds_placeholder_page() {
        let html = build(&[], "Vole", &ChartConfig::default());
        assert!(html.contains("No data to display"));
        assert!(!html.contains("new Chart"));
    }

    #[test]
    fn write_chart_uses_sanitized_title() {
        let temp = tempdir().unwrap();
        let path = write_chart(temp.path(), &[3, 4], "Guinea Pig", &ChartConfig::default())
            .unwrap()
            .expect("chart path");
        assert!(path.ends_with("Guinea_Pig_chart.html"));
        assert!(fs::read_to_string(path).unwrap().contains("data: [3,4]"));

        assert!(write_chart(temp.path(), &[], "Empty", &ChartConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn outcome_chart_is_named_after_the_species() {
        let temp = tempdir().unwrap();
        let outcome = SimulationOutcome {
            profile: SpeciesProfile::new("House Mouse", 6.0, 5.0, 0.8, 2).unwrap(),
            initial_population: 10,
            simulation_years: 1,
            history: vec![10, 14],
            average_growth_rate: 40.0,
            seed: None,
        };
        let config = ChartConfig {
            theme: Theme::Blue,
            ..ChartConfig::default()
        };
        let path = write_outcome_chart(temp.path(), &outcome, &config)
            .unwrap()
            .expect("chart path");
        assert!(path.ends_with("House_Mouse_chart.html"));
        assert!(fs::read_to_string(path).unwrap().contains("background: #e6f3ff"));
    }
}
