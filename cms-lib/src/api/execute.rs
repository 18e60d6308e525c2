//! Operation execution logic
//!
//! This module contains the HTTP execution of GraphQL documents and the
//! per-model [`ModelClient`] built on top of it.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde_json::json;

use super::crud::ModelApi;
use super::crud::conform_all;
use super::crud::conform_listed;
use super::crud::require_id;
use super::graphql::Connection;
use super::graphql::GraphQlRequest;
use super::graphql::GraphQlResponse;
use super::graphql::create_document;
use super::graphql::delete_document;
use super::graphql::list_document;
use super::graphql::update_document;
use crate::DataAuth;
use crate::DataClient;
use crate::error::ApiError;
use crate::error::Error;
use crate::model::EntityKind;
use crate::model::Record;

impl DataClient {
    /// Sends one GraphQL document and returns its `data` object.
    ///
    /// A non-2xx status, an unparseable body or a non-empty `errors` array is
    /// an error; partial data accompanying errors is discarded.
    pub async fn execute(&self, request: GraphQlRequest) -> Result<serde_json::Value, Error> {
        let mut http = self
            .inner
            .http_client
            .post(self.inner.url.clone())
            .headers(self.default_headers()?)
            .json(&request);

        if let Some(timeout) = self.inner.timeout {
            http = http.timeout(timeout);
        }

        let response = http.send().await.map_err(ApiError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;

        if !status.is_success() {
            return Err(ApiError::http(status.as_u16(), body).into());
        }

        let envelope: GraphQlResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::parse_with_body(e.to_string(), body.clone()))?;

        if !envelope.errors.is_empty() {
            return Err(ApiError::GraphQl(envelope.errors).into());
        }

        envelope
            .data
            .ok_or_else(|| ApiError::parse_with_body("response has no data", body).into())
    }

    fn default_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let (name, value) = match &self.inner.auth {
            DataAuth::ApiKey(key) => ("x-api-key", key),
            DataAuth::Token(token) => ("authorization", token),
        };
        let value = HeaderValue::from_str(value)
            .map_err(|_| ApiError::parse(format!("{} header contains invalid characters", name)))?;
        headers.insert(name, value);

        Ok(headers)
    }
}

/// CRUD handle for one entity over the GraphQL data API.
///
/// Obtained from [`DataClient::model`].
#[derive(Clone)]
pub struct ModelClient {
    client: DataClient,
    entity: EntityKind,
}

impl ModelClient {
    /// Creates a handle for `entity`.
    pub fn new(client: DataClient, entity: EntityKind) -> Self {
        Self { client, entity }
    }

    /// Runs a mutation and returns the conformed record it echoes back.
    async fn mutate(&self, document: String, field: String, input: serde_json::Value) -> Result<Option<Record>, Error> {
        let data = self
            .client
            .execute(GraphQlRequest::new(document, json!({ "input": input })))
            .await?;

        match data.get(&field).cloned() {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => {
                let record: Record = serde_json::from_value(value)?;
                let mut typed = conform_all(self.entity, vec![record])?;
                Ok(typed.pop())
            }
        }
    }
}

#[async_trait]
impl ModelApi for ModelClient {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    async fn list(&self) -> Result<Vec<Record>, Error> {
        let field = self.entity.list_field();
        let document = list_document(self.entity);
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let variables = json!({
                "limit": self.client.list_limit(),
                "nextToken": next_token,
            });
            let data = self
                .client
                .execute(GraphQlRequest::new(document.clone(), variables))
                .await?;

            let page = data
                .get(&field)
                .cloned()
                .ok_or_else(|| ApiError::parse(format!("response has no '{}' field", field)))?;
            let page: Connection = serde_json::from_value(page)?;

            records.extend(page.items.into_iter().flatten());

            match page.next_token {
                Some(token) if next_token.as_deref() == Some(token.as_str()) => {
                    log::warn!("{} list repeated its nextToken; stopping", self.entity);
                    break;
                }
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        log::debug!("Listed {} {} records", records.len(), self.entity);
        Ok(conform_listed(self.entity, records))
    }

    async fn create(&self, fields: Record) -> Result<Option<Record>, Error> {
        let input = serde_json::to_value(&fields)?;
        self.mutate(create_document(self.entity), self.entity.create_field(), input)
            .await
    }

    async fn update(&self, record: Record) -> Result<Option<Record>, Error> {
        require_id(&record)?;
        let input = serde_json::to_value(&record)?;
        self.mutate(update_document(self.entity), self.entity.update_field(), input)
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        self.mutate(
            delete_document(self.entity),
            self.entity.delete_field(),
            json!({ "id": id }),
        )
        .await?;
        Ok(())
    }
}
