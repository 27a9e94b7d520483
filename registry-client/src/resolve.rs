//! Host name resolution for registry probes.
//!
//! A probe distinguishes "this host does not exist" from every other
//! connection failure, so names are resolved up front rather than inferred
//! from transport errors.

use std::fmt;
use std::io;

/// Resolve registry host names.
#[async_trait::async_trait]
pub trait Resolve: fmt::Debug + Send + Sync + 'static {
    /// Succeeds if `host` resolves to at least one address.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<()>;
}

/// Resolves names with the operating system resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait::async_trait]
impl Resolve for SystemResolver {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn resolve(&self, host: &str, port: u16) -> io::Result<()> {
        let mut addrs = tokio::net::lookup_host((host, port)).await?;
        match addrs.next() {
            Some(addr) => {
                tracing::trace!(%addr, "resolved registry host");
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses for {host}"),
            )),
        }
    }
}
