use crate::domain::model::PortRequest;
use crate::utils::error::{ComposeError, Result};
use std::collections::BTreeSet;

/// Per-invocation record of which logical port names services consulted
/// versus which names the caller asked to expose.
///
/// Services must ask through [`PortLedger::expose`] for every port they own;
/// a requested name that no service asked about is reported as invalid.
#[derive(Debug, Clone, Default)]
pub struct PortLedger {
    requested: PortRequest,
    recorded: BTreeSet<String>,
}

impl PortLedger {
    pub fn new(requested: PortRequest) -> Self {
        Self {
            requested,
            recorded: BTreeSet::new(),
        }
    }

    /// Records `name` as owned by the calling service and returns the host port
    /// to publish, or `None` when the caller did not ask to expose it.
    pub fn expose(&mut self, name: &str, default: u16) -> Option<u16> {
        self.recorded.insert(name.to_string());
        if self.requested.contains(name) {
            Some(self.port(name, default))
        } else {
            None
        }
    }

    /// Requested override for `name`, falling back to `default`. Does not record.
    pub fn port(&self, name: &str, default: u16) -> u16 {
        self.requested.port(name).unwrap_or(default)
    }

    pub fn valid_ports(&self) -> Vec<String> {
        self.recorded.iter().cloned().collect()
    }

    pub fn invalid_ports(&self) -> Vec<String> {
        self.requested
            .names()
            .filter(|name| !self.recorded.contains(*name))
            .map(str::to_string)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = self.invalid_ports();
        if invalid.is_empty() {
            return Ok(());
        }
        Err(ComposeError::InvalidPortError {
            invalid,
            valid: self.valid_ports(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expose_records_even_when_not_requested() {
        let mut ledger = PortLedger::new(PortRequest::new());

        assert_eq!(ledger.expose("postgres", 5432), None);
        assert_eq!(ledger.valid_ports(), vec!["postgres"]);
        assert!(ledger.validate().is_ok());
    }

    #[test]
    fn test_expose_uses_override_or_default() {
        let request = PortRequest::parse("timetracker-web:9000,postgres").unwrap();
        let mut ledger = PortLedger::new(request);

        assert_eq!(ledger.expose("timetracker-web", 80), Some(9000));
        assert_eq!(ledger.expose("postgres", 5432), Some(5432));
        assert_eq!(ledger.expose("selenium-vnc", 5900), None);
    }

    #[test]
    fn test_port_lookup_does_not_record() {
        let request = PortRequest::parse("timetracker-web:9000").unwrap();
        let ledger = PortLedger::new(request);

        assert_eq!(ledger.port("timetracker-web", 18000), 9000);
        assert_eq!(ledger.port("selenium-driver", 4444), 4444);
        assert!(ledger.valid_ports().is_empty());
    }

    #[test]
    fn test_validate_reports_unrecorded_names_and_sorted_valid_set() {
        let request = PortRequest::parse("bogus-service,postgres,another").unwrap();
        let mut ledger = PortLedger::new(request);
        ledger.expose("timetracker-web", 80);
        ledger.expose("postgres", 5432);

        match ledger.validate() {
            Err(ComposeError::InvalidPortError { invalid, valid }) => {
                assert_eq!(invalid, vec!["another", "bogus-service"]);
                assert_eq!(valid, vec!["postgres", "timetracker-web"]);
            }
            other => panic!("expected InvalidPortError, got {:?}", other),
        }
    }
}
