//! Per-object constraint storage.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::Constraint;

/// Named group of constraints. Buckets run in the order of [`Bucket::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    /// Intrinsic rules such as a parameter's own bounds.
    Builtin,
    /// Rules registered by the user.
    User,
    /// Links feeding virtual mirrors of the object.
    Virtual,
}

impl Bucket {
    /// Evaluation order of the buckets.
    pub const ORDER: [Bucket; 3] = [Bucket::Builtin, Bucket::User, Bucket::Virtual];
}

/// Three insertion-ordered constraint maps keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintBuckets {
    builtin: IndexMap<String, Constraint>,
    user: IndexMap<String, Constraint>,
    #[serde(rename = "virtual")]
    virtual_links: IndexMap<String, Constraint>,
}

impl ConstraintBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constraints of one bucket in insertion order.
    pub fn bucket(&self, bucket: Bucket) -> &IndexMap<String, Constraint> {
        match bucket {
            Bucket::Builtin => &self.builtin,
            Bucket::User => &self.user,
            Bucket::Virtual => &self.virtual_links,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut IndexMap<String, Constraint> {
        match bucket {
            Bucket::Builtin => &mut self.builtin,
            Bucket::User => &mut self.user,
            Bucket::Virtual => &mut self.virtual_links,
        }
    }

    /// Insert or replace a constraint. A replaced key keeps its position.
    pub fn insert(&mut self, bucket: Bucket, key: &str, constraint: Constraint) -> Option<Constraint> {
        self.bucket_mut(bucket).insert(key.to_string(), constraint)
    }

    /// Remove a constraint, preserving the order of the rest.
    pub fn remove(&mut self, bucket: Bucket, key: &str) -> Option<Constraint> {
        self.bucket_mut(bucket).shift_remove(key)
    }

    pub fn get(&self, bucket: Bucket, key: &str) -> Option<&Constraint> {
        self.bucket(bucket).get(key)
    }

    /// Empty one bucket.
    pub fn clear(&mut self, bucket: Bucket) {
        self.bucket_mut(bucket).clear();
    }

    /// Snapshot of every constraint in evaluation order.
    pub fn ordered(&self) -> Vec<(Bucket, String, Constraint)> {
        Bucket::ORDER
            .iter()
            .flat_map(|&bucket| {
                self.bucket(bucket)
                    .iter()
                    .map(move |(key, c)| (bucket, key.clone(), c.clone()))
            })
            .collect()
    }

    /// Drop every constraint matching `predicate`, returning the removed ones.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<(Bucket, String, Constraint)>
    where
        F: FnMut(&Constraint) -> bool,
    {
        let mut removed = Vec::new();
        for bucket in Bucket::ORDER {
            let map = self.bucket_mut(bucket);
            let keys: Vec<String> = map
                .iter()
                .filter(|(_, c)| predicate(c))
                .map(|(k, _)| k.clone())
                .collect();
            for key in keys {
                if let Some(c) = map.shift_remove(&key) {
                    removed.push((bucket, key, c));
                }
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.user.len() + self.virtual_links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
