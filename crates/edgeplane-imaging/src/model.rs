//! Policy set API types

use crate::error::{ImagingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geographic region a policy set is optimised for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Us,
    Emea,
    Asia,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::Emea => "EMEA",
            Region::Asia => "ASIA",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "US" => Ok(Region::Us),
            "EMEA" => Ok(Region::Emea),
            "ASIA" => Ok(Region::Asia),
            other => Err(ImagingError::InvalidValue {
                field: "region",
                value: other.to_string(),
                expected: "US, EMEA, ASIA",
            }),
        }
    }
}

/// Media handled by the policies of a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "IMAGE" => Ok(MediaType::Image),
            "VIDEO" => Ok(MediaType::Video),
            other => Err(ImagingError::InvalidValue {
                field: "type",
                value: other.to_string(),
                expected: "IMAGE, VIDEO",
            }),
        }
    }
}

/// Policy set as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySet {
    pub id: String,
    pub name: String,
    pub region: Region,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
}

/// Body of a create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePolicySet {
    pub name: String,
    pub region: Region,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

/// Body of an update request. Media type cannot change in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePolicySet {
    pub name: String,
    pub region: Region,
}

/// One policy of a set, image or video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOutput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<bool>,
}

impl PolicyOutput {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
            video: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPoliciesResponse {
    pub item_kind: String,
    pub items: Vec<PolicyOutput>,
    pub total_items: usize,
}

impl ListPoliciesResponse {
    pub fn new(items: Vec<PolicyOutput>) -> Self {
        Self {
            item_kind: "POLICY".to_string(),
            total_items: items.len(),
            items,
        }
    }
}
