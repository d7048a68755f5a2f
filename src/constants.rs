// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used on managed resources
pub mod annotations {
    /// Stable identifier of the remote Gitea object
    pub const EXTERNAL_NAME: &str = "crossplane.io/external-name";
}

/// API group of every custom resource served by this provider
pub const API_GROUP: &str = "gitea.crossplane.io";
pub const API_VERSION: &str = "v1alpha1";

/// Finalizer guarding remote deletion
pub const FINALIZER: &str = "finalizer.managedresource.crossplane.io";

/// The operator name used for server-side apply
pub const OPERATOR_NAME: &str = "provider-gitea";

/// Gitea REST API settings
pub mod gitea {
    /// Appended once to the configured base URL
    pub const API_PATH: &str = "/api/v1";
    /// Hard deadline for a single HTTP request
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const USER_AGENT: &str = "provider-gitea";
}

/// Defaults for ProviderConfig resolution
pub mod provider_config {
    pub const DEFAULT_NAME: &str = "default";
    pub const DEFAULT_TOKEN_KEY: &str = "token";
    pub const SOURCE_SECRET: &str = "Secret";
}

/// Keys of published connection details
pub mod connection {
    pub const DATA: &str = "data";
    pub const TOKEN: &str = "token";
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRDs
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
