//! IIIF Presentation 2 manifest model

use crate::engine::PageSource;
use crate::error::ViewerError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub type_: String,
    pub label: String,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub attribution: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(rename = "@type")]
    pub type_: String,
    #[serde(default)]
    pub canvases: Vec<Canvas>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub type_: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub thumbnail: Option<Thumbnail>,
    #[serde(default)]
    pub images: Vec<Annotation>,
}

/// Image annotation painting a resource onto a canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(rename = "@type")]
    pub type_: String,
    pub resource: Resource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub service: Option<Service>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub profile: Option<String>,
}

/// Thumbnails appear both as bare URIs and as resource objects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Thumbnail {
    Uri(String),
    Resource {
        #[serde(rename = "@id")]
        id: String,
    },
}

impl Thumbnail {
    pub fn uri(&self) -> &str {
        match self {
            Thumbnail::Uri(uri) => uri,
            Thumbnail::Resource { id } => id,
        }
    }
}

impl Manifest {
    /// Flatten sequences → canvases → images into the page order
    pub fn pages(&self) -> Vec<PageSource> {
        self.sequences
            .iter()
            .flat_map(|sequence| &sequence.canvases)
            .flat_map(|canvas| {
                canvas.images.iter().map(move |image| PageSource {
                    src: image.resource.id.clone(),
                    label: canvas.label.clone(),
                    thumbnail: canvas.thumbnail.as_ref().map(|t| t.uri().to_string()),
                })
            })
            .collect()
    }
}

impl FromStr for Manifest {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}
