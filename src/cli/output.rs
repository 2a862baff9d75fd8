//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, TesseraArgs};
use crate::error::Result;

/// Boundary table of a composite view.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartsReport {
    pub segments: usize,
    pub total_doc_count: u64,
    pub starts: Vec<u64>,
}

/// Resolution of one global position.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    pub position: u64,
    pub segment: Option<usize>,
    pub local: Option<u64>,
    pub stable_id: Option<u64>,
}

/// Human-readable rendering of a report.
pub trait HumanOutput {
    fn render_human(&self) -> String;
}

impl HumanOutput for StartsReport {
    fn render_human(&self) -> String {
        let starts: Vec<String> = self.starts.iter().map(u64::to_string).collect();
        format!(
            "segments: {}\ntotal documents: {}\nstarts: [{}]",
            self.segments,
            self.total_doc_count,
            starts.join(", ")
        )
    }
}

impl HumanOutput for Vec<Resolution> {
    fn render_human(&self) -> String {
        self.iter()
            .map(|r| match (r.segment, r.local) {
                (Some(segment), Some(local)) => format!(
                    "{} -> segment {} local {} (stable id {})",
                    r.position,
                    segment,
                    local,
                    r.stable_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string())
                ),
                _ => format!("{} -> not found", r.position),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render a result in the selected format.
pub fn render<T: Serialize + HumanOutput>(result: &T, args: &TesseraArgs) -> Result<String> {
    match args.output_format {
        OutputFormat::Human => Ok(result.render_human()),
        OutputFormat::Json if args.pretty => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
    }
}

/// Print a result in the selected format.
pub fn output_result<T: Serialize + HumanOutput>(result: &T, args: &TesseraArgs) -> Result<()> {
    println!("{}", render(result, args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_starts_human() {
        let report = StartsReport {
            segments: 3,
            total_doc_count: 8,
            starts: vec![0, 5, 5, 8],
        };
        assert_eq!(
            report.render_human(),
            "segments: 3\ntotal documents: 8\nstarts: [0, 5, 5, 8]"
        );
    }

    #[test]
    fn test_render_not_found() {
        let resolutions = vec![Resolution {
            position: 9,
            segment: None,
            local: None,
            stable_id: None,
        }];
        assert_eq!(resolutions.render_human(), "9 -> not found");
    }
}
