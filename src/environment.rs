//! Hardware and platform snapshot written into perf reports
//!
//! The aggregation pipeline treats the snapshot as opaque key/value pairs.
//! Providers decide what they can find; anything they cannot is recorded as
//! unknown instead of failing the report.

use sysinfo::System;

/// Text written for a value the provider could not determine
pub const UNKNOWN_VALUE: &str = "N/A";

/// Ordered key/value view of the machine a run was measured on
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentSnapshot {
    Available(Vec<(String, Option<String>)>),
    Unavailable,
}

impl EnvironmentSnapshot {
    /// Entries with unknown values rendered as [`UNKNOWN_VALUE`]
    pub fn entries(&self) -> Vec<(&str, &str)> {
        match self {
            EnvironmentSnapshot::Available(entries) => entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_deref().unwrap_or(UNKNOWN_VALUE)))
                .collect(),
            EnvironmentSnapshot::Unavailable => Vec::new(),
        }
    }
}

/// Source of an [`EnvironmentSnapshot`]
pub trait EnvironmentProvider {
    fn snapshot(&self) -> EnvironmentSnapshot;
}

/// Introspects the host this process runs on
#[derive(Debug, Default, Clone, Copy)]
pub struct HostEnvironment;

impl EnvironmentProvider for HostEnvironment {
    fn snapshot(&self) -> EnvironmentSnapshot {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();

        let processor = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty());
        let total_memory = Some(sys.total_memory()).filter(|&bytes| bytes > 0);

        let entries = vec![
            ("platform", System::long_os_version()),
            ("processor", processor),
            ("machine", Some(std::env::consts::ARCH.to_string())),
            ("runtime", Some(format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))),
            ("cpu_count_logical", Some(num_cpus::get().to_string())),
            ("cpu_count_physical", Some(num_cpus::get_physical().to_string())),
            ("total_memory_bytes", total_memory.map(|bytes| bytes.to_string())),
        ];

        EnvironmentSnapshot::Available(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

/// Reports nothing; used when hardware introspection is switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEnvironment;

impl EnvironmentProvider for NoEnvironment {
    fn snapshot(&self) -> EnvironmentSnapshot {
        EnvironmentSnapshot::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_snapshot_has_stable_keys() {
        let snapshot = HostEnvironment.snapshot();
        let keys: Vec<_> = snapshot.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "platform",
                "processor",
                "machine",
                "runtime",
                "cpu_count_logical",
                "cpu_count_physical",
                "total_memory_bytes",
            ]
        );
    }

    #[test]
    fn test_host_snapshot_reads_memory_and_cpus() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let snapshot = HostEnvironment.snapshot();
        let entries = snapshot.entries();
        let value = |key: &str| entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v).unwrap();

        let memory: u64 = value("total_memory_bytes").parse().unwrap();
        assert!(memory > 0);
        assert_eq!(value("machine"), std::env::consts::ARCH);
        assert!(value("cpu_count_logical").parse::<usize>().unwrap() >= 1);
    }

    #[test]
    fn test_unknown_values_render_as_na() {
        let snapshot = EnvironmentSnapshot::Available(vec![
            ("machine".to_string(), Some("x86_64".to_string())),
            ("total_memory_bytes".to_string(), None),
        ]);
        assert_eq!(
            snapshot.entries(),
            vec![("machine", "x86_64"), ("total_memory_bytes", "N/A")]
        );
        assert!(NoEnvironment.snapshot().entries().is_empty());
    }
}
