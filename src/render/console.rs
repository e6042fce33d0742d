use super::ChartConfig;

/// Renders a vertical bar chart of `data`, one column per year.
///
/// Histories longer than the configured width are sampled evenly so the
/// first and last years are always shown.
pub fn render(data: &[u64], title: &str, config: &ChartConfig) -> String {
    if data.is_empty() {
        return "No data to display\n".to_string();
    }

    let height = config.height.max(1);
    let columns = data.len().min(config.width.max(1));
    let samples: Vec<u64> = (0..columns)
        .map(|col| data[sample_index(col, columns, data.len())])
        .collect();
    let max_value = data.iter().copied().max().unwrap_or(0);
    let scale = max_value as f64 / height as f64;

    let mut out = String::new();
    out.push_str(&format!("\n{title} Population Growth\n"));
    out.push_str(&format!("Max Population: {max_value}\n"));
    for y in (0..=height).rev() {
        let threshold = y as f64 * scale;
        out.push_str(&format!("{:6} │ ", threshold as u64));
        for &value in &samples {
            out.push(if value as f64 >= threshold { '█' } else { ' ' });
        }
        out.push('\n');
    }
    out.push_str(&format!("       └─{}\n", "─".repeat(columns)));
    if columns > 1 {
        out.push_str(&format!(
            "{:>10}{:>pad$}\n",
            0,
            data.len() - 1,
            pad = columns - 1
        ));
    } else {
        out.push_str(&format!("{:>10}\n", 0));
    }
    out
}

fn sample_index(col: usize, columns: usize, len: usize) -> usize {
    if columns <= 1 {
        return len - 1;
    }
    col * (len - 1) / (columns - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: usize, height: usize) -> ChartConfig {
        ChartConfig {
            width,
            height,
            ..ChartConfig::default()
        }
    }

    #[test]
    fn empty_history_renders_placeholder() {
        assert_eq!(render(&[], "Mouse", &ChartConfig::default()), "No data to display\n");
    }

    #[test]
    fn single_point_renders_one_column() {
        let chart = render(&[5], "Mouse", &config(60, 4));
        assert!(chart.contains("Mouse Population Growth"));
        assert!(chart.contains("Max Population: 5"));
        // 5 rows (height + baseline), each with exactly one filled cell.
        assert_eq!(chart.matches('█').count(), 5);
    }

    #[test]
    fn bars_scale_with_value() {
        let chart = render(&[1, 10], "Vole", &config(60, 10));
        let top_row = chart
            .lines()
            .find(|line| line.starts_with("    10 │"))
            .expect("top row");
        assert_eq!(top_row, "    10 │  █");
        assert!(chart.lines().any(|line| line == "     0 │ ██"));
    }

    #[test]
    fn long_histories_are_sampled_to_width() {
        let data: Vec<u64> = (1..=200).collect();
        let chart = render(&data, "Rat", &config(20, 5));
        let axis = chart
            .lines()
            .find(|line| line.contains('└'))
            .expect("axis line");
        assert_eq!(axis.chars().filter(|&c| c == '─').count(), 21);
        assert!(chart.trim_end().ends_with("199"));
    }

    #[test]
    fn all_zero_history_does_not_panic() {
        let chart = render(&[0, 0, 0], "Ghost", &config(10, 3));
        assert!(chart.contains("Max Population: 0"));
    }
}
