// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Orchestration of Weft site template provisioning.
//!
//! [`WebProvisioner`] decides which handlers run for a template, runs them in
//! priority order against a shared [`weft_core::ProvisioningContext`], reports
//! progress, and wraps the first failure in a [`ProvisioningError`] naming the
//! failing handler.
//!
//! ```ignore
//! let mut provisioner = WebProvisioner::new(web);
//! provisioner.setup(weft_config::load_config()?)?;
//! provisioner.apply_template(&template, None, None).await?;
//! ```

pub mod error;
pub mod logging;
pub mod plan;
pub mod provisioner;
pub mod registry;

pub use error::{ProvisioningError, Result};
pub use logging::{CaptureLayer, CapturedEvent};
pub use plan::{order_keys, plan_operations};
pub use provisioner::{ProvisionerState, WebProvisioner};
pub use registry::{HandlerRegistry, HandlerSort, UNKNOWN_SECTION_PRIORITY};
