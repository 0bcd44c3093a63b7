//! Two-level topic hierarchy.
//!
//! Documents are grouped under their main topic and then under their
//! sub-topic path:
//!
//! ```text
//! Geometry
//! ├── ()                  -> [a.pdf]
//! └── ("Shapes",)         -> [b.pdf, c.pdf]
//! ```
//!
//! Storage order is irrelevant; [`Hierarchy::ordered`] produces the
//! rendering order under a [`SortPolicy`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::catalog::{ClassifiedRecord, Classifier, Record};
use crate::config::SortPolicy;
use crate::error::{BinderError, Result};

/// Ordered sub-topic path below a main topic. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubTopics(Vec<String>);

impl SubTopics {
    /// Wrap a sub-topic path.
    pub fn new(topics: Vec<String>) -> Self {
        Self(topics)
    }

    /// Title used for contents entries: the path joined with ", ".
    pub fn title(&self) -> String {
        self.0.join(", ")
    }

    /// `true` for documents filed directly under their main topic.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sub-topics in order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for SubTopics {
    fn from(topics: Vec<String>) -> Self {
        Self(topics)
    }
}

/// Grouping key of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicKey {
    /// First entry of the topic path.
    pub main_topic: String,
    /// Remaining entries of the topic path.
    pub sub_topics: SubTopics,
}

impl TopicKey {
    /// Create a key from a main topic and its sub-topic path.
    pub fn new(main_topic: impl Into<String>, sub_topics: Vec<String>) -> Self {
        Self {
            main_topic: main_topic.into(),
            sub_topics: SubTopics(sub_topics),
        }
    }
}

/// Documents filed under one sub-topic path, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTopicGroup {
    /// The sub-topic path (empty for documents filed directly under the main topic).
    pub sub_topics: SubTopics,
    /// Document paths in insertion order.
    pub documents: Vec<PathBuf>,
}

/// A main topic with its sub-topic groups in rendering order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicGroup {
    /// Main topic title.
    pub title: String,
    /// Sub-topic groups in rendering order.
    pub groups: Vec<SubTopicGroup>,
}

/// main topic -> sub-topic path -> documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    topics: BTreeMap<String, BTreeMap<SubTopics, Vec<PathBuf>>>,
}

impl Hierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// File a document under `key`.
    ///
    /// Paths are never deduplicated: inserting the same path twice lists it
    /// twice.
    pub fn insert(&mut self, key: TopicKey, document: impl Into<PathBuf>) {
        self.topics
            .entry(key.main_topic)
            .or_default()
            .entry(key.sub_topics)
            .or_default()
            .push(document.into());
    }

    /// Documents filed under `key`, if any.
    pub fn documents(&self, key: &TopicKey) -> Option<&[PathBuf]> {
        self.topics
            .get(&key.main_topic)
            .and_then(|groups| groups.get(&key.sub_topics))
            .map(Vec::as_slice)
    }

    /// Number of main topics.
    pub fn main_topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Number of document references across all groups.
    pub fn total_documents(&self) -> usize {
        self.topics
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// `true` if nothing has been filed.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Check that every group holds at least one document.
    ///
    /// [`Hierarchy::insert`] cannot produce an empty group, but a hierarchy
    /// assembled some other way (deserialized, edited) might.
    pub fn validate(&self) -> Result<()> {
        for (main_topic, groups) in &self.topics {
            if groups.is_empty() {
                return Err(BinderError::consistency(format!(
                    "main topic '{main_topic}' has no groups"
                )));
            }
            for (sub_topics, documents) in groups {
                if documents.is_empty() {
                    return Err(BinderError::consistency(format!(
                        "group '{main_topic}' / '{}' has no documents",
                        sub_topics.title()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Main topics and their groups in rendering order.
    ///
    /// Main topics are compared by title, sub-topic groups by their joined
    /// title, both under `policy`. Groups whose joined titles tie fall back
    /// to comparing the paths element-wise.
    pub fn ordered(&self, policy: SortPolicy) -> Vec<TopicGroup> {
        let mut main_topics: Vec<&String> = self.topics.keys().collect();
        main_topics.sort_by(|a, b| policy.compare(a, b));

        main_topics
            .into_iter()
            .map(|title| {
                let mut groups: Vec<(&SubTopics, &Vec<PathBuf>)> =
                    self.topics[title].iter().collect();
                groups.sort_by(|(a, _), (b, _)| compare_sub_topics(policy, a, b));

                TopicGroup {
                    title: title.clone(),
                    groups: groups
                        .into_iter()
                        .map(|(sub_topics, documents)| SubTopicGroup {
                            sub_topics: sub_topics.clone(),
                            documents: documents.clone(),
                        })
                        .collect(),
                }
            })
            .collect()
    }

    /// Build a hierarchy from groups listed in an arbitrary order.
    ///
    /// Empty groups are kept so that [`Hierarchy::validate`] can reject them.
    pub fn from_groups(groups: impl IntoIterator<Item = (TopicKey, Vec<PathBuf>)>) -> Self {
        let mut hierarchy = Self::new();
        for (key, documents) in groups {
            hierarchy
                .topics
                .entry(key.main_topic)
                .or_default()
                .entry(key.sub_topics)
                .or_default()
                .extend(documents);
        }
        hierarchy
    }
}

fn compare_sub_topics(policy: SortPolicy, a: &SubTopics, b: &SubTopics) -> Ordering {
    policy
        .compare(&a.title(), &b.title())
        .then_with(|| a.cmp(b))
}

/// File classified records into a hierarchy, in input order.
pub fn build_from_classified<'a>(
    records: impl IntoIterator<Item = &'a ClassifiedRecord>,
) -> Hierarchy {
    let mut hierarchy = Hierarchy::new();
    for record in records {
        hierarchy.insert(record.key.clone(), record.document.clone());
    }
    hierarchy
}

/// Classify raw records and file the qualifying ones.
///
/// Records whose link is in `duplicates`, that have no topics, or that are
/// not tagged with the classifier's grade are left out.
pub fn build_hierarchy(
    records: &[Record],
    duplicates: &BTreeSet<String>,
    classifier: &Classifier,
) -> Hierarchy {
    let classified: Vec<ClassifiedRecord> = records
        .iter()
        .filter_map(|record| classifier.classify(record, duplicates))
        .collect();
    build_from_classified(&classified)
}
