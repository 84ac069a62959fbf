//! ShareController - auxiliary network shares.
//!
//! Shares are driven through a small JSON protocol on `/api/smb`, using the
//! same session as file transfers.

use fbsync_types::api::CONTENT_TYPE_JSON;
use fbsync_types::{ShareDescriptor, ShareRequest, SHARE_ACTION_LIST};
use tracing::{info, warn};

use crate::error::TransferError;
use crate::session::SessionManager;
use crate::transfer::RawBody;
use crate::transport::{HttpRequest, Method, Transport};

/// Mounts and queries the configured shares.
#[derive(Debug, Clone, Default)]
pub struct ShareController {
    shares: Vec<ShareDescriptor>,
}

impl ShareController {
    /// Create a controller for `shares`, kept in the given order.
    pub fn new(shares: Vec<ShareDescriptor>) -> Self {
        Self { shares }
    }

    /// The configured shares.
    pub fn shares(&self) -> &[ShareDescriptor] {
        &self.shares
    }

    /// Send one share request, returning the raw body on 200.
    pub async fn request<T: Transport>(
        &self,
        session: &mut SessionManager<T>,
        action: &str,
        share: &str,
        path: &str,
        data: Option<&str>,
    ) -> Result<RawBody, TransferError> {
        session.ensure_authenticated().await?;

        let body = ShareRequest::new(action, share, path, data).to_json()?;
        let mut request = HttpRequest::new(Method::Post, session.routes().smb())
            .with_header("Content-Type", CONTENT_TYPE_JSON)
            .with_body(body);
        session.attach_auth_header(&mut request);

        let response = session.transport().send(request).await?;
        match response.status {
            200 => Ok(response.body),
            status => {
                warn!("Share {} {} failed with status {}", share, action, status);
                Err(TransferError::ShareFailed {
                    share: share.to_string(),
                    status,
                })
            }
        }
    }

    /// Mount every share in order. The first failure aborts the rest.
    pub async fn mount_all<T: Transport>(
        &self,
        session: &mut SessionManager<T>,
    ) -> Result<(), TransferError> {
        for share in &self.shares {
            self.request(session, SHARE_ACTION_LIST, &share.share_name, "/", None)
                .await?;
            info!("Mounted share {}", share.share_name);
        }
        Ok(())
    }
}
