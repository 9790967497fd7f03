use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::customer::{InvalidScore, RfvScore};

const DEFAULT_ACTIONS: [(&str, &str); 4] = [
    ("AAA", "Enviar cupons de desconto, pedir indicação e enviar amostras grátis."),
    ("DDD", "Churn provável. Fazer nada."),
    ("DAA", "Churn possível. Tentar recuperar com cupons."),
    ("CAA", "Churn possível. Tentar recuperar com cupons."),
];

/// Maps composite scores to a recommended marketing action. Scores without an
/// entry simply get no recommendation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTable {
    entries: BTreeMap<RfvScore, String>,
}

impl Default for ActionTable {
    fn default() -> Self {
        let mut table = Self::new();
        for (score, action) in DEFAULT_ACTIONS {
            if let Ok(score) = score.parse() {
                table.insert(score, action);
            }
        }
        table
    }
}

impl ActionTable {
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Builds a table from raw `score = action` pairs, e.g. a config section.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, InvalidScore>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (score, action) in pairs {
            table.insert(score.as_ref().parse()?, action);
        }
        Ok(table)
    }

    pub fn insert(&mut self, score: RfvScore, action: impl Into<String>) -> Option<String> {
        self.entries.insert(score, action.into())
    }

    pub fn lookup(&self, score: &RfvScore) -> Option<&str> {
        self.entries.get(score).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RfvScore, &str)> {
        self.entries.iter().map(|(score, action)| (score, action.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::ActionTable;
    use crate::domain::customer::{Grade, RfvScore};

    #[test]
    fn default_table_covers_the_four_campaign_segments() {
        let table = ActionTable::default();

        assert_eq!(table.len(), 4);
        assert_eq!(
            table.lookup(&RfvScore::new(Grade::D, Grade::D, Grade::D)),
            Some("Churn provável. Fazer nada.")
        );
        assert_eq!(
            table.lookup(&RfvScore::new(Grade::C, Grade::A, Grade::A)),
            table.lookup(&RfvScore::new(Grade::D, Grade::A, Grade::A))
        );
    }

    #[test]
    fn unmapped_scores_have_no_action() {
        let table = ActionTable::default();

        assert_eq!(table.lookup(&RfvScore::new(Grade::B, Grade::B, Grade::B)), None);
    }

    #[test]
    fn from_pairs_rejects_invalid_keys() {
        let error = ActionTable::from_pairs([("AAX", "noop")]).expect_err("AAX is not a score");
        assert_eq!(error.0, "AAX");

        let table = ActionTable::from_pairs([("bba", "reactivate")]).expect("valid key");
        assert_eq!(table.lookup(&RfvScore::new(Grade::B, Grade::B, Grade::A)), Some("reactivate"));
    }

    #[test]
    fn insert_replaces_existing_action() {
        let mut table = ActionTable::new();
        let score = RfvScore::new(Grade::A, Grade::A, Grade::A);

        assert_eq!(table.insert(score, "first"), None);
        assert_eq!(table.insert(score, "second"), Some("first".to_string()));
        assert_eq!(table.lookup(&score), Some("second"));
    }
}
