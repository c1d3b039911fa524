use crate::dataset::{pearson, Dataset, DatasetStore};
use std::sync::Arc;

const GREETING: &str = "Hello! I can help you with stock data. Ask about companies, investments,buy, sell, hold or recommendations.";
const UNRECOGNIZED: &str = "Sorry, I didn't understand that. Please try asking about stock performance, recommendations, or trading actions (Buy, Sell, Hold).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Sell,
    Hold,
}

/// The classified purpose of a user message. Derived per message from a
/// fixed, ordered keyword list; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Recommend,
    TradeAction(TradeKind),
    ListCompanies,
    StockSummary,
    Correlation,
    Unrecognized,
}

impl Intent {
    /// Classifies an already-lowercased message. The predicates overlap
    /// ("recommend buying some stock" matches three of them), so the
    /// order here is load-bearing: first match wins.
    pub fn classify(message: &str) -> Intent {
        if message.contains("hello") {
            Intent::Greeting
        } else if message.contains("recommend") {
            Intent::Recommend
        } else if message.contains("buy") {
            Intent::TradeAction(TradeKind::Buy)
        } else if message.contains("sell") {
            Intent::TradeAction(TradeKind::Sell)
        } else if message.contains("hold") {
            Intent::TradeAction(TradeKind::Hold)
        } else if message.contains("companies") {
            Intent::ListCompanies
        } else if message.contains("stock") {
            Intent::StockSummary
        } else if message.contains("correlation") {
            Intent::Correlation
        } else {
            Intent::Unrecognized
        }
    }
}

/// Stateless chat responder over the frozen dataset snapshot. Every
/// request is classified and answered independently; there is no
/// multi-turn memory.
pub struct ChatService {
    store: Arc<DatasetStore>,
}

impl ChatService {
    pub fn new(store: Arc<DatasetStore>) -> Self {
        Self { store }
    }

    pub fn respond(&self, message: &str) -> String {
        let message = message.to_lowercase();

        match Intent::classify(&message) {
            Intent::Greeting => GREETING.to_string(),
            Intent::Recommend => self.recommendations(),
            Intent::TradeAction(kind) => match self.extract_company(&message) {
                Some(company) => self.trading_action(company, kind),
                None => "Please specify a valid company name for trading actions.".to_string(),
            },
            Intent::ListCompanies => format!(
                "I have data for these companies: {}",
                self.company_listing()
            ),
            Intent::StockSummary => match self.extract_company(&message) {
                Some(company) => self.stock_summary(company),
                None => "Please specify a company name.".to_string(),
            },
            Intent::Correlation => match self.extract_company(&message) {
                Some(company) => self.correlation_info(company),
                None => "Please specify a company name for correlation analysis.".to_string(),
            },
            Intent::Unrecognized => UNRECOGNIZED.to_string(),
        }
    }

    /// First store key that appears as a substring of the normalized
    /// message. Store keys iterate in sorted order, so ties resolve to
    /// the alphabetically first company.
    fn extract_company<'a>(&'a self, message: &str) -> Option<&'a str> {
        self.store.keys().find(|key| message.contains(key))
    }

    fn company_listing(&self) -> String {
        self.store.keys().collect::<Vec<_>>().join(", ")
    }

    fn stock_summary(&self, company: &str) -> String {
        let Some(dataset) = self.store.get(company) else {
            return format!("I don't have data for {}.", company);
        };

        let summary = dataset.latest("Close").and_then(|latest_close| {
            let high_price = dataset.max("High")?;
            let low_price = dataset.min("Low")?;
            let total_volume = dataset.sum("Volume")?;
            Some((latest_close, high_price, low_price, total_volume))
        });

        match summary {
            Some((latest_close, high_price, low_price, total_volume)) => format!(
                "Stock Summary for {}:\n\
                 Latest Close Price: ${:.2}\n\
                 Highest Price: ${:.2}\n\
                 Lowest Price: ${:.2}\n\
                 Total Trading Volume: {} shares",
                company, latest_close, high_price, low_price, total_volume as u64
            ),
            None => format!("Data for {} is incomplete.", company),
        }
    }

    fn recommendations(&self) -> String {
        if self.store.is_empty() {
            return "No datasets available to generate recommendations.".to_string();
        }

        let recommendations: Vec<&str> = self
            .store
            .iter()
            .filter(|(_, dataset)| exceeds_return_threshold(dataset))
            .map(|(company, _)| company)
            .collect();

        if recommendations.is_empty() {
            format!(
                "Recommended stocks for potential trading: tsla, amd, mtdr.\
                 Here are the available companies: {}",
                self.company_listing()
            )
        } else {
            format!(
                "Recommended stocks based on performance: {}",
                recommendations.join(", ")
            )
        }
    }

    fn trading_action(&self, company: &str, kind: TradeKind) -> String {
        let Some(dataset) = self.store.get(company) else {
            return format!("I don't have data for {}.", company);
        };

        let Some(latest_close) = dataset.latest("Close") else {
            return format!("Data for {} is incomplete for trading actions.", company);
        };

        match kind {
            TradeKind::Buy => format!(
                "You could consider BUYING {}. The latest closing price is ${:.2}.",
                company, latest_close
            ),
            TradeKind::Sell => format!(
                "You could consider SELLING {}. The latest closing price is ${:.2}.",
                company, latest_close
            ),
            TradeKind::Hold => format!(
                "It might be wise to HOLD {} for now. The latest closing price is ${:.2}.",
                company, latest_close
            ),
        }
    }

    fn correlation_info(&self, company: &str) -> String {
        let Some(dataset) = self.store.get(company) else {
            return format!("I don't have data for {}.", company);
        };

        match (dataset.numeric("Close"), dataset.numeric("Volume")) {
            (Some(close), Some(volume)) => format!(
                "The correlation between {}'s closing price and trading volume is {:.2}.",
                company,
                pearson(close, volume)
            ),
            _ => format!(
                "Data for {} is missing required columns ('Close' and 'Volume').",
                company
            ),
        }
    }
}

/// Recommendation heuristic: average of all Close values minus average of
/// all Open values (whole-column means, not a row-paired difference) must
/// exceed 5.
fn exceeds_return_threshold(dataset: &Dataset) -> bool {
    match (dataset.mean("Close"), dataset.mean("Open")) {
        (Some(close_mean), Some(open_mean)) => close_mean - open_mean > 5.0,
        _ => false,
    }
}
