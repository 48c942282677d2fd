//! Visualization utilities for TSP solutions.
//!
//! Generates SVG drawings of tours, a progress chart and a text histogram of
//! where the improvements were found.

use crate::evolution::ProgressBucket;
use crate::instance::TspInstance;
use crate::solution::Solution;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Percentage points represented by one histogram block
const PERCENT_PER_BLOCK: f64 = 2.0;

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// City radius
    pub node_radius: f64,
    /// Draw city indices next to the cities
    pub show_labels: bool,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 5.0,
            show_labels: true,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the cities and the closed tour of a solution
    pub fn generate_svg(&self, instance: &TspInstance, solution: &Solution) -> String {
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.get_bounds(instance);

        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .city {{ fill: #3498db; stroke: #2c3e50; stroke-width: 1; }}
    .start {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 1; }}
    .edge {{ stroke: #34495e; stroke-width: 1.5; fill: none; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">{} | {} cities | Distance: {:.2} | Generations: {}</text>
"##,
            self.margin,
            escape_xml(&instance.name),
            instance.dimension(),
            solution.distance,
            solution.generations
        ));

        let transform = |x: f64, y: f64| -> (f64, f64) {
            let tx = self.margin + (x - min_x) * scale;
            let ty = self.height - self.margin - (y - min_y) * scale;
            (tx, ty)
        };
        let position = |index: usize| -> Option<(f64, f64)> {
            instance
                .cities
                .get(index)
                .map(|city| transform(city.x as f64, city.y as f64))
        };

        if solution.tour.len() > 1 {
            let mut points = Vec::with_capacity(solution.tour.len());
            for &city in &solution.tour {
                if let Some((x, y)) = position(city) {
                    points.push(format!("{:.2},{:.2}", x, y));
                }
            }
            svg.push_str(&format!(
                r#"<polygon points="{}" class="edge"/>
"#,
                points.join(" ")
            ));
        }

        for (index, city) in instance.cities.iter().enumerate() {
            let (x, y) = transform(city.x as f64, city.y as f64);
            let class = if solution.tour.first() == Some(&index) {
                "start"
            } else {
                "city"
            };

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
"##,
                x, y, self.node_radius, class
            ));

            if self.show_labels {
                svg.push_str(&format!(
                    r##"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                    x, y - self.node_radius - 3.0, index
                ));
            }
        }

        svg.push_str("</svg>");

        svg
    }

    /// Bar chart of the improvement found in each tenth of the generations
    pub fn generate_progress_svg(&self, buckets: &[ProgressBucket]) -> String {
        let mut svg = String::new();

        let width = self.width;
        let height = 300.0;
        let margin = 50.0;

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .bar {{ fill: #3498db; stroke: #2c3e50; stroke-width: 1; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 11px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
<text x="{}" y="25" class="title">Progress distribution</text>
"##,
            width, height, width, height, margin
        ));

        let plot_width = width - 2.0 * margin;
        let plot_height = height - 2.0 * margin;
        let baseline = height - margin;

        svg.push_str(&format!(
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
"##,
            margin, baseline, width - margin, baseline
        ));

        let visible: Vec<&ProgressBucket> = buckets.iter().filter(|b| b.is_visible()).collect();
        let slot = plot_width / visible.len().max(1) as f64;
        for (i, bucket) in visible.iter().enumerate() {
            let bar_height = plot_height * bucket.share.clamp(0.0, 100.0) / 100.0;
            let x = margin + i as f64 * slot;
            svg.push_str(&format!(
                r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" class="bar"/>
<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{:.1}%</text>
<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}-{}</text>
"##,
                x + 2.0,
                baseline - bar_height,
                (slot - 4.0).max(1.0),
                bar_height,
                x + slot / 2.0,
                baseline - bar_height - 4.0,
                bucket.share,
                x + slot / 2.0,
                baseline + 15.0,
                bucket.first_generation,
                bucket.last_generation
            ));
        }

        svg.push_str("</svg>");

        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Get coordinate bounds
    fn get_bounds(&self, instance: &TspInstance) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for city in &instance.cities {
            min_x = min_x.min(city.x as f64);
            max_x = max_x.max(city.x as f64);
            min_y = min_y.min(city.y as f64);
            max_y = max_y.max(city.y as f64);
        }

        (min_x, max_x, min_y, max_y)
    }
}

/// Escape the XML special characters of a text node or attribute value
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the progress distribution as text.
///
/// One line per bucket: the generation range, one block per two percent of
/// the overall improvement, then the percentage and the rounded improvement.
/// Buckets covering no generation are left out.
pub fn render_progress_histogram(buckets: &[ProgressBucket]) -> String {
    let mut text = String::new();
    for bucket in buckets.iter().filter(|b| b.is_visible()) {
        let blocks = (bucket.share / PERCENT_PER_BLOCK).floor().max(0.0) as usize;
        text.push_str(&format!(
            "{:>7} - {:<7} |{} {:.1}% ({})\n",
            bucket.first_generation,
            bucket.last_generation,
            "#".repeat(blocks),
            bucket.share,
            bucket.improvement.round()
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::{EvolutionSettings, EvolutionWorker, ProgressLog, StopPolicy};
    use crate::instance::City;

    fn create_test_solution() -> (TspInstance, Solution) {
        let cities = vec![City::new(0, 0), City::new(100, 0), City::new(50, 80), City::new(0, 60)];
        let instance = TspInstance::new("square".to_string(), cities).unwrap();
        let mut worker = EvolutionWorker::new(
            instance.distance_matrix.clone(),
            EvolutionSettings {
                population_count: 6,
                ..Default::default()
            },
        );
        let policy = StopPolicy::GenerationLimit(5);
        let outcomes = vec![worker.run_evolution(policy)];
        let solution = Solution::from_worker(&instance.name, &worker, policy, &outcomes);
        (instance, solution)
    }

    #[test]
    fn test_visualizer() {
        let (instance, solution) = create_test_solution();

        let viz = Visualizer::new();
        let svg = viz.generate_svg(&instance, &solution);

        assert!(svg.starts_with("<?xml"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("square"));
        assert_eq!(svg.matches("<circle").count(), 4);
        assert_eq!(svg.matches("class=\"start\"").count(), 1);
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn test_progress_svg_has_one_bar_per_bucket() {
        let mut log = ProgressLog::new();
        log.record(3, 10.0);
        let svg = Visualizer::new().generate_progress_svg(&log.distribution(50));
        assert_eq!(svg.matches("class=\"bar\"").count(), 10);
        assert!(svg.contains("100.0%"));
    }

    #[test]
    fn test_svg_escapes_instance_name() {
        let (mut instance, solution) = create_test_solution();
        instance.name = "north & south <v2>".to_string();

        let svg = Visualizer::new().generate_svg(&instance, &solution);
        assert!(svg.contains("north &amp; south &lt;v2&gt;"));
        assert!(!svg.contains("north & south"));
    }

    #[test]
    fn test_short_run_renders_only_covered_generations() {
        let mut log = ProgressLog::new();
        log.record(1, 6.0);
        log.record(3, 2.0);
        let buckets = log.distribution(3);

        let text = render_progress_histogram(&buckets);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("      1 - 1"));
        assert!(lines[1].starts_with("      2 - 2"));
        assert!(lines[2].starts_with("      3 - 3"));
        assert!(lines[0].ends_with("75.0% (6)"));

        let svg = Visualizer::new().generate_progress_svg(&buckets);
        assert_eq!(svg.matches("class=\"bar\"").count(), 3);
        assert!(!svg.contains(">2-1<"));
    }

    #[test]
    fn test_histogram_blocks() {
        let mut log = ProgressLog::new();
        log.record(1, 30.0);
        log.record(100, 10.0);
        let text = render_progress_histogram(&log.distribution(100));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 10);
        // 75% -> 37 blocks, 25% -> 12 blocks
        assert_eq!(lines[0].matches('#').count(), 37);
        assert!(lines[0].ends_with("75.0% (30)"));
        assert_eq!(lines[9].matches('#').count(), 12);
        assert!(lines[5].ends_with("| 0.0% (0)"));
    }
}
