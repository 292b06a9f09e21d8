use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::budget::RequestBudget;
use crate::data_source::{ChartRequest, ChartSource, SourceError};
use crate::fetcher::ResilientFetcher;
use crate::http_client::browser_headers;
use crate::normalize::{chart_error, decode_chart};
use crate::RawSeriesPayload;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance v8 chart endpoint.
///
/// Every call charges the shared [`RequestBudget`] before going out; a
/// rejected check never reaches the network.
#[derive(Clone)]
pub struct YahooChartSource {
    base_url: String,
    budget: Arc<RequestBudget>,
    fetcher: ResilientFetcher,
    headers: BTreeMap<String, String>,
}

impl YahooChartSource {
    pub fn new(base_url: impl Into<String>, budget: Arc<RequestBudget>, fetcher: ResilientFetcher) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            budget,
            fetcher,
            headers: browser_headers(),
        }
    }

    pub fn budget(&self) -> &Arc<RequestBudget> {
        &self.budget
    }

    pub fn chart_url(&self, req: &ChartRequest) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}",
            self.base_url,
            urlencoding::encode(req.symbol.as_str()),
            req.start.unix_timestamp(),
            req.end.unix_timestamp(),
            req.interval.as_str()
        )
    }

    async fn fetch_chart(&self, req: &ChartRequest) -> Result<RawSeriesPayload, SourceError> {
        self.budget.acquire()?;

        let url = self.chart_url(req);
        let response = self.fetcher.fetch(&url, &self.headers).await?;
        debug!(symbol = %req.symbol, status = response.status, "chart response received");

        if !response.is_success() {
            return Err(chart_error(response.status, &response.body));
        }

        decode_chart(&response.body)
    }
}

impl ChartSource for YahooChartSource {
    fn chart<'a>(
        &'a self,
        req: ChartRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawSeriesPayload, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_chart(&req).await })
    }
}
