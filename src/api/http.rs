//! HTTP client for the backend's status and notification endpoints.
//! Uses reqwest-middleware for transient-failure retries.

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::{NotificationApi, StatusSource};
use crate::config::Config;
use crate::errors::ClientError;
use crate::models::notification::{ListBody, NotificationItem, ReleaseNoteNotification, UnreadCount};
use crate::models::session::SessionHandle;
use crate::models::status::StatusPayload;

#[derive(Clone)]
pub struct HttpApi {
    client: ClientWithMiddleware,
    base: Url,
    status_url: Url,
    session: SessionHandle,
}

impl HttpApi {
    pub fn new(
        api_url: &str,
        status_url: &str,
        session: SessionHandle,
        timeout: Duration,
        retries: u32,
    ) -> Result<Self, ClientError> {
        let reqwest_client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("tidings/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut builder = ClientBuilder::new(reqwest_client);
        if retries > 0 {
            let retry_policy = ExponentialBackoff::builder().build_with_max_retries(retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(Self {
            client: builder.build(),
            base: Url::parse(api_url)?,
            status_url: Url::parse(status_url)?,
            session,
        })
    }

    pub fn from_config(cfg: &Config, session: SessionHandle) -> Result<Self, ClientError> {
        Self::new(
            &cfg.api_url,
            &cfg.status_url,
            session,
            cfg.http_timeout,
            cfg.http_retries,
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    async fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.session.token().await.ok_or(ClientError::Unauthenticated)?;
        Ok(req.header("Authorization", format!("Bearer {}", token)))
    }

    async fn send(&self, req: RequestBuilder) -> Result<String, ClientError> {
        let resp = req.header("Accept", "application/json").send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                body: body.chars().take(200).collect(),
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let body = self.send(req).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl StatusSource for HttpApi {
    async fn fetch_status(&self) -> Result<StatusPayload, ClientError> {
        self.get_json(self.client.get(self.status_url.clone())).await
    }
}

#[async_trait]
impl NotificationApi for HttpApi {
    async fn unread_count(&self) -> Result<u64, ClientError> {
        let req = self
            .authorized(self.client.get(self.endpoint("notifications/unread-count/")?))
            .await?;
        let count: UnreadCount = self.get_json(req).await?;
        Ok(count.count)
    }

    async fn list_notifications(&self, unread_only: bool) -> Result<Vec<NotificationItem>, ClientError> {
        let mut url = self.endpoint("notifications/")?;
        if unread_only {
            url.query_pairs_mut().append_pair("unread", "true");
        }
        let req = self.authorized(self.client.get(url)).await?;
        let body: ListBody<NotificationItem> = self.get_json(req).await?;
        Ok(body.into_vec())
    }

    async fn list_release_notes(&self) -> Result<Vec<ReleaseNoteNotification>, ClientError> {
        let req = self
            .authorized(self.client.get(self.endpoint("notifications/release-notes/")?))
            .await?;
        let body: ListBody<ReleaseNoteNotification> = self.get_json(req).await?;
        Ok(body.into_vec())
    }

    async fn mark_read(&self, notification_id: i64) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("notifications/{}/read/", notification_id))?;
        let req = self.authorized(self.client.post(url)).await?;
        self.send(req).await?;
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<(), ClientError> {
        let req = self
            .authorized(self.client.post(self.endpoint("notifications/mark-all-read/")?))
            .await?;
        self.send(req).await?;
        Ok(())
    }
}
