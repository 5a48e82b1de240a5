//! GoogleSheetsSink - replaces one worksheet per partner through the Sheets v4 API

use contracts::{ContractError, PublishReceipt, SheetSink, SheetTable};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_TOKEN_FILE: &str = "token.json";
const SPREADSHEET_ENV: &str = "GOOGLE_SHEET_ID";
const CLEAR_RANGE: &str = "A:Z";

/// Configuration for GoogleSheetsSink
#[derive(Debug, Clone)]
pub struct GoogleSheetsConfig {
    pub spreadsheet_id: String,
    pub token_file: PathBuf,
    pub base_url: String,
    pub timeout: Duration,
}

impl GoogleSheetsConfig {
    /// Create config from params map
    ///
    /// `spreadsheet_id` falls back to the `GOOGLE_SHEET_ID` environment variable.
    pub fn from_params(
        sink_name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let spreadsheet_id = params
            .get("spreadsheet_id")
            .cloned()
            .or_else(|| std::env::var(SPREADSHEET_ENV).ok())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                ContractError::sink_connection(
                    sink_name,
                    format!("missing 'spreadsheet_id' param and {SPREADSHEET_ENV} is not set"),
                )
            })?;

        let timeout_secs = match params.get("timeout_secs") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ContractError::sink_connection(sink_name, format!("invalid timeout_secs: {e}"))
            })?,
            None => 30,
        };

        Ok(Self {
            spreadsheet_id,
            token_file: params
                .get("token_file")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE)),
            base_url: params
                .get("base_url")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Authorized-user credentials as stored by the OAuth installed-app flow
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl AuthorizedUser {
    /// Read a token file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Quote a sheet name into an A1 range, e.g. `'Deutsche Bank'!A1`
pub fn a1_range(sheet_name: &str, range: &str) -> String {
    format!("'{}'!{}", sheet_name.replace('\'', "''"), range)
}

/// `repeatCell` requests applying the table's number formats to its data rows
pub fn format_requests(sheet_id: i64, table: &SheetTable) -> Vec<Value> {
    let data_rows = table.rows.len();
    table
        .formats
        .iter()
        .map(|f| {
            json!({
                "repeatCell": {
                    "range": {
                        "sheetId": sheet_id,
                        "startRowIndex": 1,
                        "endRowIndex": data_rows + 1,
                        "startColumnIndex": f.column,
                        "endColumnIndex": f.column + 1,
                    },
                    "cell": {
                        "userEnteredFormat": {
                            "numberFormat": {
                                "type": "NUMBER",
                                "pattern": f.format.pattern(),
                            }
                        }
                    },
                    "fields": "userEnteredFormat.numberFormat",
                }
            })
        })
        .collect()
}

/// Sink writing each partner table into a worksheet of one spreadsheet
pub struct GoogleSheetsSink {
    name: String,
    config: GoogleSheetsConfig,
    client: Client,
    access_token: String,
    /// Worksheet title -> sheetId, filled lazily
    sheet_ids: HashMap<String, i64>,
}

impl GoogleSheetsSink {
    /// Load credentials and build the HTTP client
    ///
    /// The access token is refreshed once here when a refresh token is present.
    pub async fn connect(
        name: impl Into<String>,
        config: GoogleSheetsConfig,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;

        let creds = AuthorizedUser::load(&config.token_file).map_err(|e| {
            ContractError::sink_connection(
                &name,
                format!("cannot read token file {}: {e}", config.token_file.display()),
            )
        })?;

        let access_token = if creds.can_refresh() {
            refresh_access_token(&client, &name, &creds).await?
        } else {
            creds.token.clone().ok_or_else(|| {
                ContractError::sink_connection(&name, "token file has neither token nor refresh_token")
            })?
        };

        info!(
            sink = %name,
            url = %format!("https://docs.google.com/spreadsheets/d/{}", config.spreadsheet_id),
            "GoogleSheetsSink ready"
        );

        Ok(Self {
            name,
            config,
            client,
            access_token,
            sheet_ids: HashMap::new(),
        })
    }

    /// Create from a sink params map, as `create_sink` does
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = GoogleSheetsConfig::from_params(&name, params)?;
        Self::connect(name, config).await
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ContractError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ContractError::sink_connection(&self.name, "base_url cannot be a base"))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.config.spreadsheet_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value, ContractError> {
        let mut request = self
            .client
            .request(method, url.clone())
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ContractError::sink_write(
                &self.name,
                format!("{url} returned {status}: {text}"),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, format!("{url}: invalid body: {e}")))
    }

    async fn batch_update(&self, requests: Vec<Value>) -> Result<Value, ContractError> {
        let mut url = self.url(&[])?;
        let path = format!("{}:batchUpdate", url.path());
        url.set_path(&path);
        self.send(Method::POST, url, Some(&json!({ "requests": requests })))
            .await
    }

    async fn ensure_sheet(&mut self, title: &str) -> Result<i64, ContractError> {
        if let Some(id) = self.sheet_ids.get(title) {
            return Ok(*id);
        }

        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");
        let meta = self.send(Method::GET, url, None).await?;
        for sheet in meta["sheets"].as_array().into_iter().flatten() {
            let props = &sheet["properties"];
            if let (Some(t), Some(id)) = (props["title"].as_str(), props["sheetId"].as_i64()) {
                self.sheet_ids.insert(t.to_string(), id);
            }
        }
        if let Some(id) = self.sheet_ids.get(title) {
            return Ok(*id);
        }

        let reply = self
            .batch_update(vec![json!({ "addSheet": { "properties": { "title": title } } })])
            .await?;
        let id = reply["replies"][0]["addSheet"]["properties"]["sheetId"]
            .as_i64()
            .ok_or_else(|| ContractError::sink_write(&self.name, "addSheet reply without sheetId"))?;
        info!(sink = %self.name, sheet = %title, sheet_id = id, "sheet created");
        self.sheet_ids.insert(title.to_string(), id);
        Ok(id)
    }

    async fn clear_sheet(&self, title: &str) -> Result<(), ContractError> {
        let range = format!("{}:clear", a1_range(title, CLEAR_RANGE));
        let url = self.url(&["values", &range])?;
        self.send(Method::POST, url, Some(&json!({}))).await?;
        debug!(sink = %self.name, sheet = %title, "sheet cleared");
        Ok(())
    }

    async fn write_values(&self, table: &SheetTable) -> Result<usize, ContractError> {
        let range = a1_range(&table.sheet_name, "A1");
        let mut url = self.url(&["values", &range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({ "values": table.values() });
        let reply = self.send(Method::PUT, url, Some(&body)).await?;
        Ok(reply["updatedCells"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or_else(|| table.cell_count()))
    }
}

async fn refresh_access_token(
    client: &Client,
    sink_name: &str,
    creds: &AuthorizedUser,
) -> Result<String, ContractError> {
    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", creds.refresh_token.as_deref().unwrap_or_default()),
        ("client_id", creds.client_id.as_deref().unwrap_or_default()),
        ("client_secret", creds.client_secret.as_deref().unwrap_or_default()),
    ];

    let response = client
        .post(&creds.token_uri)
        .form(&form)
        .send()
        .await
        .map_err(|e| ContractError::sink_connection(sink_name, format!("token refresh: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ContractError::sink_connection(
            sink_name,
            format!("token refresh returned {status}: {text}"),
        ));
    }

    let body: RefreshResponse = response
        .json()
        .await
        .map_err(|e| ContractError::sink_connection(sink_name, format!("token refresh: {e}")))?;
    debug!(sink = %sink_name, "access token refreshed");
    Ok(body.access_token)
}

impl SheetSink for GoogleSheetsSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "google_sheets_publish",
        skip(self, table),
        fields(sink = %self.name, sheet = %table.sheet_name, rows = table.rows.len())
    )]
    async fn publish(&mut self, table: &SheetTable) -> Result<PublishReceipt, ContractError> {
        let sheet_id = self.ensure_sheet(&table.sheet_name).await?;
        self.clear_sheet(&table.sheet_name).await?;
        let updated_cells = self.write_values(table).await?;

        let requests = format_requests(sheet_id, table);
        if !requests.is_empty() && !table.rows.is_empty() {
            self.batch_update(requests).await?;
            debug!(sink = %self.name, sheet = %table.sheet_name, "number formats applied");
        }

        Ok(PublishReceipt { updated_cells })
    }

    #[instrument(name = "google_sheets_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "GoogleSheetsSink closed");
        Ok(())
    }
}
