use crate::console::model::SurfaceReport;

/// Plain-text rendering of surface reports on stdout.
pub struct ConsolePrinter {
    max_rows: usize,
}

impl ConsolePrinter {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    pub fn render(&self, report: &SurfaceReport) -> Vec<String> {
        let mut lines = vec![format!(
            "[{}] {} ({} pinned)",
            report.surface, report.status, report.pinned
        )];
        lines.extend(report.rows.iter().take(self.max_rows).map(|row| {
            format!(
                "  {:<8} {:<12} {} ({})",
                row.color.hex(),
                row.region,
                row.summary(),
                row.location_source.label()
            )
        }));
        if report.rows.len() > self.max_rows {
            lines.push(format!("  ... {} more", report.rows.len() - self.max_rows));
        }
        lines
    }

    pub fn publish(&self, report: &SurfaceReport) {
        for line in self.render(report) {
            println!("{}", line);
        }
    }

    pub fn publish_status(&self, message: &str) {
        println!("[watcher] {}", message);
    }
}
