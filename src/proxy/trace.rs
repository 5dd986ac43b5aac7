// Per-item diagnostic trace.

/// Timestamped step descriptions accumulated while one queued item is
/// processed. On failure the trace is appended to the error surfaced to the
/// caller; on success it is dropped with the item, so it never grows across
/// the process lifetime.
#[derive(Debug, Default)]
pub struct CallTrace {
    steps: Vec<String>,
}

impl CallTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one step, mirrored to the debug log.
    pub fn note(&mut self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        tracing::debug!("{}", msg);
        self.steps
            .push(format!("[{}] {}", chrono::Utc::now().to_rfc3339(), msg));
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn report(&self) -> String {
        self.steps.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_accumulates_timestamped_steps() {
        let mut trace = CallTrace::new();
        assert!(trace.is_empty());

        trace.note("refreshing access token");
        trace.note("response status 200");

        let report = trace.report();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("refreshing access token"));
        assert!(lines[1].ends_with("response status 200"));
    }
}
