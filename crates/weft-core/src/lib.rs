// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Weft site template provisioning.
//!
//! This crate provides:
//! - [`Template`] and the typed section payloads it carries
//! - [`ProvisioningContext`] - run-scoped lookup state shared by handlers
//! - [`TokenResolver`] and [`SiteEnvironment`] - the two token substitution passes
//! - [`Handler`] - the contract every section handler implements
//! - [`WebClient`] - the port through which handlers reach the target web

pub mod context;
pub mod error;
pub mod handler;
pub mod schema;
pub mod section;
pub mod token;
pub mod url_tokens;
pub mod web;

pub use context::{ContentTypeDescriptor, ProvisioningContext, WebInfo};
pub use error::{HandlerError, TemplateError, UnknownSection, WebError, WebResult};
pub use handler::{Handler, HandlerLog, HandlerSettings};
pub use schema::{parse_section, Template};
pub use section::Section;
pub use token::{tokenize, Segment, Token, TokenKind, TokenResolver};
pub use url_tokens::SiteEnvironment;
pub use web::{
	FieldInfo, FieldUpdate, FileAddRequest, NavigationLocation, NavigationNodeInfo, ThemeRequest,
	ViewInfo, WebClient, WebPartRequest,
};
