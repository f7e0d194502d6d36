//! # Request Shape Validation
//!
//! Two request forms are validated here before anything reaches storage:
//!
//! - **Group fetch**: `?group_id=root,id1,id2` plus an `If-None-Match`
//!   header carrying one client-held version token per id, `root`
//!   included. Parsed into a [`GroupRequest`].
//! - **Poke**: `?doc=a,b` or `?route=r`, selecting what a device should
//!   be told to refetch. Parsed into a [`PokeTarget`].
//!
//! Validation stops at the first offending element.

use crate::error::ValidationError;
use crate::subdoc::{SubdocId, SubdocRegistry, ROOT};
use crate::version::Version;

/// A validated group fetch.
///
/// `root` is always the implicit first member; `members` holds the
/// remaining ids in request order, each paired with the token the client
/// already holds for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRequest {
    root_version: Version,
    members: Vec<(SubdocId, Version)>,
}

impl GroupRequest {
    /// Validate the raw `group_id` value and `If-None-Match` header.
    pub fn parse(
        group_id: Option<&str>,
        if_none_match: Option<&str>,
        registry: &SubdocRegistry,
    ) -> Result<Self, ValidationError> {
        let group_id = group_id
            .filter(|g| !g.is_empty())
            .ok_or(ValidationError::MissingGroupId)?;
        let ids: Vec<&str> = group_id.split(',').collect();

        let (first, rest) = ids
            .split_first()
            .ok_or(ValidationError::MissingGroupId)?;
        if *first != ROOT {
            return Err(ValidationError::MissingRoot((*first).to_string()));
        }
        let mut member_ids = Vec::with_capacity(rest.len());
        for id in rest {
            let id = registry
                .resolve(id)
                .ok_or_else(|| ValidationError::UnknownSubdoc((*id).to_string()))?;
            member_ids.push(id);
        }

        let versions: Vec<Version> = match if_none_match.map(str::trim) {
            Some(header) if !header.is_empty() => header
                .split(',')
                .map(|v| Version::new(v.trim()))
                .collect(),
            _ => Vec::new(),
        };
        if versions.len() != ids.len() {
            return Err(ValidationError::VersionCountMismatch {
                ids: ids.len(),
                versions: versions.len(),
            });
        }

        let mut versions = versions.into_iter();
        let root_version = versions
            .next()
            .ok_or(ValidationError::VersionCountMismatch { ids: ids.len(), versions: 0 })?;
        Ok(Self {
            root_version,
            members: member_ids.into_iter().zip(versions).collect(),
        })
    }

    /// The full parsed id list, `root` first.
    pub fn ids(&self) -> Vec<SubdocId> {
        std::iter::once(SubdocId::root())
            .chain(self.members.iter().map(|(id, _)| id.clone()))
            .collect()
    }

    /// Non-root members with their client-held tokens, in request order.
    pub fn members(&self) -> &[(SubdocId, Version)] {
        &self.members
    }

    /// The client-held aggregate root token.
    pub fn root_version(&self) -> &Version {
        &self.root_version
    }
}

// -- Poke ----------------------------------------------------------------------

/// The doc and route names a poke may select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokeTargets {
    /// Names accepted in `?doc=`.
    pub docs: Vec<String>,
    /// Names accepted in `?route=`.
    pub routes: Vec<String>,
}

impl Default for PokeTargets {
    fn default() -> Self {
        Self {
            docs: vec!["primary".to_string(), "telemetry".to_string()],
            routes: vec!["mqtt".to_string()],
        }
    }
}

/// What a validated poke asks the device to refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PokeTarget {
    /// One or more named documents, in request order.
    Docs(Vec<String>),
    /// A single delivery route.
    Route(String),
    /// Neither form was given: refetch everything.
    Root,
}

impl PokeTarget {
    /// Validate `?doc=` and `?route=`. `doc` wins when both are present;
    /// empty values count as absent.
    pub fn parse(
        doc: Option<&str>,
        route: Option<&str>,
        targets: &PokeTargets,
    ) -> Result<Self, ValidationError> {
        if let Some(doc) = doc.filter(|d| !d.is_empty()) {
            let names: Vec<String> = doc.split(',').map(str::to_string).collect();
            if let Some(bad) = names.iter().find(|n| !targets.docs.contains(n)) {
                return Err(ValidationError::InvalidPokeDoc(bad.clone()));
            }
            return Ok(Self::Docs(names));
        }
        if let Some(route) = route.filter(|r| !r.is_empty()) {
            if !targets.routes.iter().any(|r| r == route) {
                return Err(ValidationError::InvalidPokeRoute(route.to_string()));
            }
            return Ok(Self::Route(route.to_string()));
        }
        Ok(Self::Root)
    }

    /// The action label: the doc list joined by commas, the route, or `root`.
    pub fn action(&self) -> String {
        match self {
            Self::Docs(names) => names.join(","),
            Self::Route(route) => route.clone(),
            Self::Root => ROOT.to_string(),
        }
    }
}
