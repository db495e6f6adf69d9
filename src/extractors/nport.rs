// src/extractors/nport.rs

// --- Imports ---
use crate::edgar::client::Fetch;
use crate::edgar::models::{FilingRecord, Holding, IndexEntry, MISSING_HOLDING_NAME, MISSING_HOLDING_TYPE};
use crate::utils::error::{ExtractError, FilingError};
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, Node};

// --- Constants ---
const XML_OPEN: &str = "<XML>";
const XML_CLOSE: &str = "</XML>";
const HOLDING_ELEMENT: &str = "invstOrSec";
const SERIES_ID_PREFIX: char = 'S';

// Class tickers live in the SGML header of the submission text file, where tags are never closed.
static TICKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<CLASS-CONTRACT-TICKER-SYMBOL>\s*([^<\r\n]*)")
        .expect("Failed to compile TICKER_RE")
});

// --- Field table ---

/// A value that can be read from element text or fall back to a default.
pub trait FieldValue: Sized {
    type Default: Copy;

    fn from_default(default: Self::Default) -> Self;
    fn from_text(field: &'static str, text: &str) -> Result<Self, ExtractError>;
}

impl FieldValue for String {
    type Default = &'static str;

    fn from_default(default: &'static str) -> Self {
        default.to_string()
    }

    fn from_text(_field: &'static str, text: &str) -> Result<Self, ExtractError> {
        Ok(text.to_string())
    }
}

impl FieldValue for f64 {
    type Default = f64;

    fn from_default(default: f64) -> Self {
        default
    }

    // `str::parse` also accepts NaN and infinities; amounts must be finite.
    fn from_text(field: &'static str, text: &str) -> Result<Self, ExtractError> {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ExtractError::InvalidNumber {
                field,
                value: text.to_string(),
            })
    }
}

impl FieldValue for Option<u64> {
    type Default = Option<u64>;

    fn from_default(default: Option<u64>) -> Self {
        default
    }

    fn from_text(field: &'static str, text: &str) -> Result<Self, ExtractError> {
        text.parse().map(Some).map_err(|_| ExtractError::InvalidInteger {
            field,
            value: text.to_string(),
        })
    }
}

/// Maps one output field to candidate source elements (local names, tried
/// in order) and a typed default used when none of them is present.
pub struct FieldRule<T: FieldValue> {
    pub field: &'static str,
    pub sources: &'static [&'static str],
    pub default: T::Default,
}

impl<T: FieldValue> FieldRule<T> {
    /// Evaluates the rule against the first matching element below `scope`.
    fn evaluate(&self, scope: Node<'_, '_>) -> Result<T, ExtractError> {
        match self.sources.iter().find_map(|name| find_element(scope, name)) {
            Some(element) => T::from_text(self.field, element_text(element).trim()),
            None => Ok(T::from_default(self.default)),
        }
    }
}

const AS_OF_DATE: FieldRule<String> = FieldRule { field: "as_of_date", sources: &["repPdDate"], default: "" };
const CIK_NUMBER: FieldRule<Option<u64>> = FieldRule { field: "cik_number", sources: &["cik"], default: None };
const SERIES_NAME: FieldRule<String> = FieldRule { field: "series_name", sources: &["seriesName"], default: "" };
const SERIES_ID: FieldRule<String> = FieldRule { field: "series_id", sources: &["seriesId"], default: "" };
const TOTAL_ASSETS: FieldRule<f64> = FieldRule { field: "total_assets", sources: &["totAssets"], default: 0.0 };
const NET_ASSETS: FieldRule<f64> = FieldRule { field: "net_assets", sources: &["netAssets"], default: 0.0 };

const HOLDING_NAME: FieldRule<String> = FieldRule { field: "holding_name", sources: &["name", "title"], default: MISSING_HOLDING_NAME };
const HOLDING_TITLE: FieldRule<String> = FieldRule { field: "holding_title", sources: &["title"], default: MISSING_HOLDING_NAME };
const HOLDING_SHARE: FieldRule<f64> = FieldRule { field: "holding_share", sources: &["balance"], default: 0.0 };
const HOLDING_VALUE: FieldRule<f64> = FieldRule { field: "holding_value", sources: &["valUSD"], default: 0.0 };
const HOLDING_TYPE: FieldRule<String> = FieldRule { field: "holding_type", sources: &["assetCat"], default: MISSING_HOLDING_TYPE };

// --- Extractor ---

/// Turns NPORT-P submissions into [`FilingRecord`]s.
#[derive(Debug, Default)]
pub struct NportExtractor;

impl NportExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Downloads the filing at `url` (one attempt) and parses it.
    pub async fn extract<F: Fetch>(
        &self,
        fetcher: &F,
        url: &str,
        entry: &IndexEntry,
    ) -> Result<FilingRecord, FilingError> {
        let document = fetcher.get_text(url).await?;
        tracing::debug!("Parsing {} ({} bytes)", url, document.len());
        Ok(self.parse_filing(&document, entry)?)
    }

    /// Parses a filing document: either a bare NPORT XML document or a full
    /// submission text file wrapping one in `<XML>` tags.
    pub fn parse_filing(&self, document: &str, entry: &IndexEntry) -> Result<FilingRecord, ExtractError> {
        let xml = xml_body(document);
        let doc = Document::parse(xml).map_err(|e| ExtractError::Xml(e.to_string()))?;
        let root = doc.root_element();

        let series_id: String = SERIES_ID.evaluate(root)?;
        let holdings = root
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == HOLDING_ELEMENT)
            .map(parse_holding)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FilingRecord {
            as_of_date: AS_OF_DATE.evaluate(root)?,
            cik_number: CIK_NUMBER.evaluate(root)?,
            series_name: SERIES_NAME.evaluate(root)?,
            series_number: series_number(&series_id)?,
            total_assets: TOTAL_ASSETS.evaluate(root)?,
            net_assets: NET_ASSETS.evaluate(root)?,
            series_tickers: tickers(document),
            holdings,
            filing_date: entry.date_filed,
            company_name: entry.company_name.clone(),
        })
    }
}

fn parse_holding(node: Node<'_, '_>) -> Result<Holding, ExtractError> {
    Ok(Holding {
        holding_name: HOLDING_NAME.evaluate(node)?,
        holding_title: HOLDING_TITLE.evaluate(node)?,
        holding_share: HOLDING_SHARE.evaluate(node)?,
        holding_value: HOLDING_VALUE.evaluate(node)?,
        holding_type: HOLDING_TYPE.evaluate(node)?,
    })
}

/// `S000001234` -> `Some(1234)`; identifiers without the prefix yield `None`.
fn series_number(series_id: &str) -> Result<Option<u64>, ExtractError> {
    match series_id.strip_prefix(SERIES_ID_PREFIX) {
        Some(digits) => <Option<u64> as FieldValue>::from_text("series_number", digits),
        None => Ok(None),
    }
}

fn tickers(document: &str) -> Vec<String> {
    TICKER_RE
        .captures_iter(document)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|ticker| !ticker.is_empty())
        .collect()
}

fn xml_body(document: &str) -> &str {
    if let Some(start) = document.find(XML_OPEN) {
        let body = &document[start + XML_OPEN.len()..];
        let end = body.find(XML_CLOSE).unwrap_or(body.len());
        return body[..end].trim();
    }
    document.trim()
}

fn find_element<'a, 'input>(scope: Node<'a, 'input>, local_name: &str) -> Option<Node<'a, 'input>> {
    scope
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == local_name)
}

fn element_text(element: Node<'_, '_>) -> String {
    element
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::client::stub::StubFetcher;
    use crate::utils::error::EdgarError;
    use chrono::NaiveDate;

    const SUBMISSION: &str = r#"<SEC-DOCUMENT>0001752724-20-141234.txt : 20200717
<SEC-HEADER>0001752724-20-141234.hdr.sgml : 20200717
<SERIES-AND-CLASSES-CONTRACTS-DATA>
<EXISTING-SERIES-AND-CLASSES-CONTRACTS>
<SERIES>
<SERIES-ID>S000007715
<CLASS-CONTRACT>
<CLASS-CONTRACT-TICKER-SYMBOL>GCEQX
</CLASS-CONTRACT>
<CLASS-CONTRACT>
<CLASS-CONTRACT-TICKER-SYMBOL>GCEIX
</CLASS-CONTRACT>
</SERIES>
</EXISTING-SERIES-AND-CLASSES-CONTRACTS>
</SERIES-AND-CLASSES-CONTRACTS-DATA>
</SEC-HEADER>
<DOCUMENT>
<TYPE>NPORT-P
<TEXT>
<XML>
<?xml version="1.0" encoding="UTF-8"?>
<edgarSubmission xmlns="http://www.sec.gov/edgar/nport" xmlns:com="http://www.sec.gov/edgar/common">
  <headerData>
    <filerInfo><filer><issuerCredentials><cik>0000877232</cik></issuerCredentials></filer>
      <seriesClassInfo><seriesId>S000007715</seriesId></seriesClassInfo>
    </filerInfo>
  </headerData>
  <formData>
    <genInfo>
      <seriesName> Green Century Equity Fund </seriesName>
      <seriesId>S000007715</seriesId>
      <repPdDate>2020-04-30</repPdDate>
    </genInfo>
    <fundInfo>
      <totAssets>318112687.53</totAssets>
      <netAssets>318798341.2</netAssets>
    </fundInfo>
    <invstOrSecs>
      <invstOrSec>
        <name>Apple Inc</name>
        <title>Apple Inc</title>
        <balance>50386.00000000</balance>
        <valUSD>14812051.28</valUSD>
        <assetCat>EC</assetCat>
      </invstOrSec>
      <invstOrSec>
        <name>N/A</name>
        <title>US TREASURY N/B</title>
        <balance>1000</balance>
        <valUSD>1000.5</valUSD>
        <assetCat>DBT</assetCat>
      </invstOrSec>
      <invstOrSec>
        <title>Fallback Title Co</title>
      </invstOrSec>
    </invstOrSecs>
  </formData>
</edgarSubmission>
</XML>
</TEXT>
</DOCUMENT>
</SEC-DOCUMENT>
"#;

    fn entry() -> IndexEntry {
        IndexEntry {
            form_type: "NPORT-P".to_string(),
            company_name: "Green Century Funds".to_string(),
            cik: "877232".to_string(),
            file_path: "edgar/data/877232/0001752724-20-141234.txt".to_string(),
            date_filed: NaiveDate::from_ymd_opt(2020, 7, 17).unwrap(),
        }
    }

    #[test]
    fn extracts_scalars_tickers_and_holdings_from_submission() {
        let record = NportExtractor::new().parse_filing(SUBMISSION, &entry()).unwrap();

        assert_eq!(record.as_of_date, "2020-04-30");
        assert_eq!(record.cik_number, Some(877232));
        assert_eq!(record.series_name, "Green Century Equity Fund");
        assert_eq!(record.series_number, Some(7715));
        assert_eq!(record.total_assets, 318112687.53);
        assert_eq!(record.net_assets, 318798341.2);
        assert_eq!(record.series_tickers, vec!["GCEQX", "GCEIX"]);
        assert_eq!(record.filing_date, entry().date_filed);
        assert_eq!(record.company_name, "Green Century Funds");

        assert_eq!(record.holdings.len(), 3);
        assert_eq!(record.holdings[0].holding_name, "Apple Inc");
        assert_eq!(record.holdings[0].holding_share, 50386.0);
        assert_eq!(record.holdings[0].holding_type, "EC");
        assert_eq!(record.holdings[1].holding_name, "N/A");
        assert_eq!(record.holdings[1].holding_title, "US TREASURY N/B");
    }

    #[test]
    fn holding_without_name_uses_title_and_numeric_defaults() {
        let record = NportExtractor::new().parse_filing(SUBMISSION, &entry()).unwrap();
        let holding = &record.holdings[2];

        assert_eq!(holding.holding_name, "Fallback Title Co");
        assert_eq!(holding.holding_share, 0.0);
        assert_eq!(holding.holding_value, 0.0);
        assert_eq!(holding.holding_type, "OTHER");
    }

    #[test]
    fn missing_elements_fall_back_to_defaults() {
        let xml = "<edgarSubmission><formData><invstOrSec/></formData></edgarSubmission>";
        let record = NportExtractor::new().parse_filing(xml, &entry()).unwrap();

        assert_eq!(record.as_of_date, "");
        assert_eq!(record.cik_number, None);
        assert_eq!(record.series_name, "");
        assert_eq!(record.series_number, None);
        assert_eq!(record.total_assets, 0.0);
        assert_eq!(record.net_assets, 0.0);
        assert!(record.series_tickers.is_empty());
        assert_eq!(record.holdings[0].holding_name, "N/A");
        assert_eq!(record.holdings[0].holding_title, "N/A");
    }

    #[test]
    fn document_without_holdings_yields_empty_list() {
        let xml = "<edgarSubmission><netAssets>12.5</netAssets></edgarSubmission>";
        let record = NportExtractor::new().parse_filing(xml, &entry()).unwrap();
        assert!(record.holdings.is_empty());
        assert_eq!(record.net_assets, 12.5);
    }

    #[test]
    fn series_number_requires_prefix() {
        assert_eq!(series_number("S0001234").unwrap(), Some(1234));
        assert_eq!(series_number("X9").unwrap(), None);
        assert_eq!(series_number("").unwrap(), None);
        assert!(series_number("Sabc").is_err());
    }

    #[test]
    fn malformed_number_is_a_parse_failure() {
        let xml = "<edgarSubmission><totAssets>lots</totAssets></edgarSubmission>";
        let err = NportExtractor::new().parse_filing(xml, &entry()).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidNumber { field: "total_assets", .. }));
    }

    #[test]
    fn non_finite_numbers_are_parse_failures() {
        let extractor = NportExtractor::new();

        let xml = "<edgarSubmission><netAssets>NaN</netAssets></edgarSubmission>";
        let err = extractor.parse_filing(xml, &entry()).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidNumber { field: "net_assets", .. }));

        for value in ["inf", "-Infinity", "nan"] {
            let xml = format!(
                "<edgarSubmission><invstOrSec><name>A</name><valUSD>{}</valUSD></invstOrSec></edgarSubmission>",
                value
            );
            let err = extractor.parse_filing(&xml, &entry()).unwrap_err();
            assert!(matches!(err, ExtractError::InvalidNumber { field: "holding_value", .. }), "{}", value);
        }
    }

    #[test]
    fn malformed_xml_is_a_parse_failure() {
        let err = NportExtractor::new().parse_filing("<edgarSubmission><cik>1</edgar", &entry()).unwrap_err();
        assert!(matches!(err, ExtractError::Xml(_)));
    }

    #[tokio::test]
    async fn failed_fetch_produces_no_record() {
        let url = "http://edgar.test/Archives/edgar/data/877232/missing.txt";
        let fetcher = StubFetcher::new().with_status(url, 503);

        let result = NportExtractor::new().extract(&fetcher, url, &entry()).await;
        assert!(matches!(result, Err(FilingError::Fetch(EdgarError::Http(_)))));
        assert_eq!(fetcher.request_count(url), 1);
    }
}
