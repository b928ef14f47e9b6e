//! Load test clients that stamp a fresh UUID into a transaction template.

use bytes::{BufMut, Bytes, BytesMut};
use relay_common::constants::{TEMPLATE_PREFIX_LEN, TEMPLATE_SUFFIX_OFFSET};
use uuid::Uuid;

use crate::{
    config::LoadTestConfig,
    template::{TemplateError, TemplateSource},
};

/// Length of a hyphenated UUID string.
const TOKEN_LEN: usize = 36;

/// Creates one [`TxClient`] per load test connection.
pub trait ClientFactory: Send + Sync {
    /// The client type produced.
    type Client: TxClient;

    /// Checks that the load test configuration suits this factory.
    fn validate_config(&self, config: &LoadTestConfig) -> Result<(), ClientError>;

    /// Creates a client.
    fn new_client(&self, config: &LoadTestConfig) -> Result<Self::Client, ClientError>;
}

/// Generates raw transactions for one connection.
pub trait TxClient: Send + 'static {
    /// Generates the next transaction.
    fn generate_tx(&mut self) -> Result<Bytes, ClientError>;
}

/// Builds [`TemplateClient`]s from a [`TemplateSource`].
#[derive(Debug, Clone, Default)]
pub struct TemplateClientFactory<S> {
    source: S,
}

impl<S: TemplateSource> TemplateClientFactory<S> {
    /// A factory drawing templates from `source`.
    pub const fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: TemplateSource> ClientFactory for TemplateClientFactory<S> {
    type Client = TemplateClient;

    fn validate_config(&self, _config: &LoadTestConfig) -> Result<(), ClientError> {
        Ok(())
    }

    fn new_client(&self, _config: &LoadTestConfig) -> Result<TemplateClient, ClientError> {
        TemplateClient::new(self.source.produce()?)
    }
}

/// Generates transactions by stamping a fresh UUID into a template.
///
/// The output is `template[..8] ++ uuid ++ template[44..]`, so every
/// transaction hashes differently and none is rejected as a duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateClient {
    template: Bytes,
}

impl TemplateClient {
    /// Wraps `template`, which must be at least 44 bytes long.
    pub fn new(template: Bytes) -> Result<Self, ClientError> {
        if template.len() < TEMPLATE_SUFFIX_OFFSET {
            return Err(ClientError::TemplateTooShort {
                len: template.len(),
                min: TEMPLATE_SUFFIX_OFFSET,
            });
        }
        Ok(Self { template })
    }

    /// The template transactions are generated from.
    pub const fn template(&self) -> &Bytes {
        &self.template
    }

    /// Builds a transaction carrying `token`.
    pub fn stamp(&self, token: Uuid) -> Bytes {
        let suffix = &self.template[TEMPLATE_SUFFIX_OFFSET..];
        let mut tx = BytesMut::with_capacity(TEMPLATE_PREFIX_LEN + TOKEN_LEN + suffix.len());
        tx.put_slice(&self.template[..TEMPLATE_PREFIX_LEN]);
        tx.put_slice(token.hyphenated().encode_lower(&mut Uuid::encode_buffer()).as_bytes());
        tx.put_slice(suffix);
        tx.freeze()
    }
}

impl TxClient for TemplateClient {
    fn generate_tx(&mut self) -> Result<Bytes, ClientError> {
        Ok(self.stamp(Uuid::new_v4()))
    }
}

/// Errors that can occur while creating or running a client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The template could not be produced
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// The template cannot hold a token
    #[error("transaction template is {len} bytes, at least {min} required")]
    TemplateTooShort {
        /// Template length.
        len: usize,
        /// Minimum length.
        min: usize,
    },
}
