use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{
    cleanup::rules::{Classification, RuleChain},
    error::Result,
    people::Person,
    utils,
};

/// A contact the rule chain decided to keep, with the deciding reason.
#[derive(Debug, Clone)]
pub struct KeptContact {
    pub person: Person,
    pub reason: String,
}

/// The fetched contacts split into two disjoint sets, each in fetch order.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub kept: Vec<KeptContact>,
    pub to_delete: Vec<Person>,
}

impl Partition {
    pub fn classify(chain: &RuleChain, contacts: Vec<Person>) -> Self {
        let mut partition = Partition::default();
        for person in contacts {
            match chain.classify(&person) {
                Classification::Keep(reason) => partition.kept.push(KeptContact { person, reason }),
                Classification::Delete => partition.to_delete.push(person),
            }
        }
        info!(
            "Classified contacts: {} kept, {} to delete",
            partition.kept.len(),
            partition.to_delete.len()
        );
        partition
    }

    pub fn len(&self) -> usize {
        self.kept.len() + self.to_delete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Serialize)]
struct KeptRow<'a> {
    #[serde(rename = "PhoneNumbers")]
    phone_numbers: String,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Reason")]
    reason: &'a str,
}

#[derive(Serialize)]
struct DeletedRow<'a> {
    #[serde(rename = "PhoneNumbers")]
    phone_numbers: String,
    #[serde(rename = "Name")]
    name: &'a str,
}

/// Where the two CSV files were written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub kept: PathBuf,
    pub to_delete: PathBuf,
}

/// Write the kept set (with reasons) and the delete set as CSV files.
pub fn export(partition: &Partition, keep_path: &Path, delete_path: &Path) -> Result<ExportPaths> {
    for path in [keep_path, delete_path] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(keep_path)?;
    for kept in &partition.kept {
        writer.serialize(KeptRow {
            phone_numbers: utils::joined_phone_numbers(&kept.person),
            name: kept.person.display_name(),
            reason: &kept.reason,
        })?;
    }
    // serialize() only emits headers with the first record
    if partition.kept.is_empty() {
        writer.write_record(["PhoneNumbers", "Name", "Reason"])?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(delete_path)?;
    for person in &partition.to_delete {
        writer.serialize(DeletedRow {
            phone_numbers: utils::joined_phone_numbers(person),
            name: person.display_name(),
        })?;
    }
    if partition.to_delete.is_empty() {
        writer.write_record(["PhoneNumbers", "Name"])?;
    }
    writer.flush()?;

    info!(
        "Saved {} kept contacts to {} and {} contacts to delete to {}",
        partition.kept.len(),
        keep_path.display(),
        partition.to_delete.len(),
        delete_path.display()
    );

    Ok(ExportPaths {
        kept: keep_path.to_path_buf(),
        to_delete: delete_path.to_path_buf(),
    })
}
