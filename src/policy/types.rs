//! ODRL policy types exchanged during negotiation

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub left_operand: String,
    pub operator: String,
    #[serde(default)]
    pub right_operand: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraint: Vec<Constraint>,
}

impl Rule {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            constraint: Vec::new(),
        }
    }

    pub fn with_constraint(
        mut self,
        left_operand: impl Into<String>,
        operator: impl Into<String>,
        right_operand: impl Into<String>,
    ) -> Self {
        self.constraint.push(Constraint {
            left_operand: left_operand.into(),
            operator: operator.into(),
            right_operand: right_operand.into(),
        });
        self
    }
}

/// A proposed usage policy bound to a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    #[serde(rename = "@id")]
    pub id: String,
    pub target: String,
    pub assigner: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub permission: Vec<Rule>,
    #[serde(default)]
    pub prohibition: Vec<Rule>,
}

impl Offer {
    pub fn new(
        id: impl Into<String>,
        target: impl Into<String>,
        assigner: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            assigner: assigner.into(),
            assignee: String::new(),
            permission: Vec::new(),
            prohibition: Vec::new(),
        }
    }

    pub fn with_permission(mut self, rule: Rule) -> Self {
        self.permission.push(rule);
        self
    }

    pub fn with_prohibition(mut self, rule: Rule) -> Self {
        self.prohibition.push(rule);
        self
    }

    /// Bind consumer-supplied values into a copy of this offer.
    ///
    /// Each key names a constraint `leftOperand`; every constraint on that
    /// operand, in permissions and prohibitions, takes the value. Keys that no
    /// constraint uses are rejected. `self` is never modified.
    pub fn bind(&self, values: &HashMap<String, String>) -> Result<Offer, ProtocolError> {
        let mut bound = self.clone();
        for (operand, value) in values {
            let mut matched = false;
            let rules = bound.permission.iter_mut().chain(bound.prohibition.iter_mut());
            for constraint in rules.flat_map(|r| r.constraint.iter_mut()) {
                if &constraint.left_operand == operand {
                    constraint.right_operand = value.clone();
                    matched = true;
                }
            }
            if !matched {
                return Err(ProtocolError::InvalidRequest(format!(
                    "offer {} has no constraint on {}",
                    self.id, operand
                )));
            }
        }
        Ok(bound)
    }
}

/// The accepted, immutable policy instance produced by a negotiation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    #[serde(rename = "@id")]
    pub id: String,
    pub target: String,
    pub assigner: String,
    pub assignee: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub permission: Vec<Rule>,
}

impl Agreement {
    /// Agreement over `offer` between its assigner and `assignee`
    pub fn from_offer(id: impl Into<String>, offer: &Offer, assignee: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: offer.target.clone(),
            assigner: offer.assigner.clone(),
            assignee: assignee.into(),
            timestamp: Utc::now(),
            permission: offer.permission.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer() -> Offer {
        Offer::new("ofr-1", "ds-1", "prov-A")
            .with_permission(Rule::new("use").with_constraint("purpose", "eq", ""))
            .with_prohibition(Rule::new("distribute").with_constraint("spatial", "eq", "EU"))
    }

    #[test]
    fn test_bind_returns_transient_copy() {
        let stored = offer();
        let values = HashMap::from([("purpose".to_string(), "research".to_string())]);

        let bound = stored.bind(&values).unwrap();
        assert_eq!(bound.permission[0].constraint[0].right_operand, "research");
        assert_eq!(stored.permission[0].constraint[0].right_operand, "");
        assert_eq!(bound.prohibition, stored.prohibition);
    }

    #[test]
    fn test_bind_unknown_operand_rejected() {
        let values = HashMap::from([("dateTime".to_string(), "2030".to_string())]);
        let err = offer().bind(&values).unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[test]
    fn test_offer_wire_names() {
        let json = serde_json::to_value(offer()).unwrap();
        assert_eq!(json["@id"], "ofr-1");
        assert_eq!(json["assigner"], "prov-A");
        assert_eq!(json["permission"][0]["constraint"][0]["leftOperand"], "purpose");

        let minimal: Offer = serde_json::from_value(serde_json::json!({
            "@id": "ofr-2",
            "target": "ds-2",
            "assigner": "prov-B",
        }))
        .unwrap();
        assert!(minimal.permission.is_empty());
        assert_eq!(minimal.assignee, "");
    }

    #[test]
    fn test_agreement_from_offer() {
        let agreement = Agreement::from_offer("agr-1", &offer(), "cons-B");
        assert_eq!(agreement.target, "ds-1");
        assert_eq!(agreement.assigner, "prov-A");
        assert_eq!(agreement.assignee, "cons-B");
        assert_eq!(agreement.permission.len(), 1);
    }
}
