//! Parses the registry CSV grammar: `dataset,cluster,dbtype,node,host,port,
//! port_env,env`, headers required.
//!
//! `csv` is new to this workspace — `qail-pg`'s only tabular data lived in
//! SQL result sets, never a CSV file — brought in because spec.md §6 names
//! a literal CSV grammar for registry-from-file loading; parsing it by hand
//! with `split(',')` would miss quoting/escaping the crate already solves.

use vexdb_core::error::DiscoveryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub dataset: String,
    pub cluster: String,
    pub dbtype: String,
    pub node: String,
    pub host: String,
    pub port: u16,
    pub port_env: Option<String>,
    pub env: String,
}

const EXPECTED_HEADER: &[&str] = &["dataset", "cluster", "dbtype", "node", "host", "port", "port_env", "env"];

pub fn parse_registry_csv(data: &str) -> Result<Vec<RegistryEntry>, DiscoveryError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(data.as_bytes());

    let headers = reader.headers().map_err(|e| DiscoveryError::Config(e.to_string()))?;
    if headers.iter().ne(EXPECTED_HEADER.iter().copied()) {
        return Err(DiscoveryError::Config(format!(
            "unexpected registry csv header: {:?}, expected {:?}",
            headers, EXPECTED_HEADER
        )));
    }

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DiscoveryError::Config(e.to_string()))?;
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        let port: u16 = field(5).parse().map_err(|_| DiscoveryError::Config(format!("invalid port in row {record:?}")))?;
        entries.push(RegistryEntry {
            dataset: field(0),
            cluster: field(1),
            dbtype: field(2),
            node: field(3),
            host: field(4),
            port,
            port_env: record.get(6).filter(|s| !s.is_empty()).map(str::to_string),
            env: field(7),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_in_declared_order() {
        let csv = "dataset,cluster,dbtype,node,host,port,port_env,env\n\
                   trades,prod-a,vexdb,node1,db1.internal,5010,,prod\n";
        let entries = parse_registry_csv(csv).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].dataset, "trades");
        assert_eq!(entries[0].port, 5010);
        assert_eq!(entries[0].port_env, None);
    }

    #[test]
    fn rejects_mismatched_header() {
        let csv = "a,b,c\n1,2,3\n";
        assert!(parse_registry_csv(csv).is_err());
    }
}
