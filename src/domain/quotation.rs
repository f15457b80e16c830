//! Price quotes for a base platform plus options and logistics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::{formatting::Formattable, macros::format_description, OffsetDateTime};

use super::{
    catalog::Catalog,
    entities::{Currency, SkuId},
    error::{CalcError, CalcResult},
};

const QUOTE_VALIDITY_NOTE: &str =
    "* Valid for 30 days. All prices exclude local import duties and taxes.";

/// What the salesperson picked in the quotation builder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub model_name: String,
    pub currency: Currency,
    pub region: String,
    pub delivery_method: String,
    /// Quantities per option; zero entries are ignored.
    pub option_quantities: HashMap<SkuId, u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub sku_id: SkuId,
    pub name: String,
    /// Converted into the quote currency.
    pub unit_price: f64,
    pub quantity: u32,
}

impl QuoteLine {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// A fully converted quote; every amount is in `currency`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub model_name: String,
    pub model_id: String,
    pub standard_includes: Vec<String>,
    pub warranty_base: String,
    pub base_price: f64,
    pub lines: Vec<QuoteLine>,
    pub region: String,
    pub delivery_method: String,
    pub shipping_cost: f64,
    pub currency: Currency,
    pub exchange_rate: f64,
    /// Configured EUR→USD rate, quoted in the footnote whatever the currency.
    pub eur_to_usd: f64,
    pub grand_total: f64,
}

impl PriceQuote {
    pub fn option_subtotal(&self) -> f64 {
        self.lines.iter().map(QuoteLine::subtotal).sum()
    }

    pub fn has_free_shipping(&self) -> bool {
        self.shipping_cost == 0.0
    }

    pub fn symbol(&self) -> &'static str {
        self.currency.symbol()
    }
}

/// Prices `request` against the catalog.
///
/// Options are converted per unit before multiplying by quantity, and lines
/// keep price-list order.
pub fn price_quote(
    catalog: &Catalog,
    request: &QuoteRequest,
    wildcard: &str,
) -> CalcResult<PriceQuote> {
    let platform = catalog.base_model(&request.model_name)?;
    let shipping = catalog.shipping_rule(&request.region, &request.delivery_method)?;

    let eur_to_usd = catalog.settings.eur_to_usd();
    let rate = request.currency.rate(eur_to_usd);

    for (sku, quantity) in &request.option_quantities {
        if *quantity == 0 {
            continue;
        }
        let eligible = catalog
            .options
            .get(sku)
            .map(|option| option.applies_to(&platform.model_id, wildcard))
            .unwrap_or(false);
        if !eligible {
            return Err(CalcError::UnknownOption {
                sku: sku.clone(),
                model: platform.model_name.clone(),
            });
        }
    }

    let lines: Vec<QuoteLine> = catalog
        .eligible_options(platform, wildcard)
        .filter_map(|option| {
            let quantity = request
                .option_quantities
                .get(&option.sku_id)
                .copied()
                .filter(|qty| *qty > 0)?;
            Some(QuoteLine {
                sku_id: option.sku_id.clone(),
                name: option.item_name.clone(),
                unit_price: option.price_eur * rate,
                quantity,
            })
        })
        .collect();

    let base_price = platform.price_eur * rate;
    let shipping_cost = shipping.cost_eur * rate;
    let option_total: f64 = lines.iter().map(QuoteLine::subtotal).sum();

    Ok(PriceQuote {
        model_name: platform.model_name.clone(),
        model_id: platform.model_id.clone(),
        standard_includes: platform.standard_includes.clone(),
        warranty_base: platform.warranty_base.clone(),
        base_price,
        lines,
        region: shipping.region.clone(),
        delivery_method: shipping.delivery_method.clone(),
        shipping_cost,
        currency: request.currency,
        exchange_rate: rate,
        eur_to_usd,
        grand_total: base_price + option_total + shipping_cost,
    })
}

/// Line item as printed on the quote document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocumentLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Final values handed to the external document renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuoteDocument {
    pub reference: String,
    pub issue_date: String,
    pub file_name: String,
    pub model_name: String,
    pub standard_includes: Vec<String>,
    pub warranty_base: String,
    pub destination: String,
    pub shipping_terms: String,
    pub lines: Vec<DocumentLine>,
    pub shipping_cost: f64,
    pub grand_total: f64,
    pub currency_symbol: String,
    pub exchange_note: String,
    pub footer: String,
}

impl QuoteDocument {
    /// Returns `None` for an empty quote; there is nothing to send out.
    pub fn from_quote(quote: &PriceQuote, issued_at: OffsetDateTime) -> CalcResult<Option<Self>> {
        if quote.grand_total <= 0.0 {
            return Ok(None);
        }

        let reference = stamp(issued_at, format_description!("[year][month][day][hour][minute]"))?;
        let issue_date = stamp(issued_at, format_description!("[year]-[month]-[day]"))?;
        let day = stamp(issued_at, format_description!("[year][month][day]"))?;

        let mut lines: Vec<DocumentLine> = quote
            .lines
            .iter()
            .map(|line| DocumentLine {
                description: line.name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal(),
            })
            .collect();
        lines.push(DocumentLine {
            description: format!("Logistics Charge ({})", quote.delivery_method),
            quantity: 1,
            unit_price: quote.shipping_cost,
            subtotal: quote.shipping_cost,
        });

        Ok(Some(Self {
            reference: format!("REF: {reference}"),
            issue_date,
            file_name: format!("Cleanuva_Quote_{}_{day}.pdf", quote.model_name),
            model_name: quote.model_name.clone(),
            standard_includes: quote.standard_includes.clone(),
            warranty_base: quote.warranty_base.clone(),
            destination: quote.region.clone(),
            shipping_terms: quote.delivery_method.clone(),
            lines,
            shipping_cost: quote.shipping_cost,
            grand_total: quote.grand_total,
            currency_symbol: quote.symbol().to_string(),
            exchange_note: format!(
                "* Excl. Local Import Duties. Exchange Rate: 1 EUR = {} USD",
                quote.eur_to_usd
            ),
            footer: QUOTE_VALIDITY_NOTE.to_string(),
        }))
    }
}

fn stamp(at: OffsetDateTime, format: &(impl Formattable + ?Sized)) -> CalcResult<String> {
    at.format(format)
        .map_err(|err| CalcError::Document(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;
    use time::macros::datetime;

    use super::*;
    use crate::domain::{
        catalog::{shipping_key, Settings, Table},
        entities::{BasePlatform, OptionSku, ShippingRule},
    };

    fn catalog() -> Catalog {
        let platforms = vec![
            BasePlatform {
                model_name: "NuvaSpan S2".to_string(),
                model_id: "NS2".to_string(),
                price_eur: 50_000.0,
                standard_includes: vec!["Robot".to_string(), "Dock".to_string()],
                warranty_base: "2 years".to_string(),
            },
            BasePlatform {
                model_name: "NuvaTrack T1".to_string(),
                model_id: "NT1".to_string(),
                price_eur: 30_000.0,
                standard_includes: vec!["Robot".to_string()],
                warranty_base: "1 year".to_string(),
            },
        ];
        let options = vec![
            OptionSku {
                sku_id: "SKU-BAT".to_string(),
                item_name: "Spare battery".to_string(),
                price_eur: 1_000.0,
                applicable_to: "ALL".to_string(),
            },
            OptionSku {
                sku_id: "SKU-BRG".to_string(),
                item_name: "Row bridge kit".to_string(),
                price_eur: 2_500.0,
                applicable_to: "NS2,NS3".to_string(),
            },
        ];
        let shipping = vec![
            ShippingRule {
                region: "Europe".to_string(),
                delivery_method: "DAP".to_string(),
                cost_eur: 500.0,
            },
            ShippingRule {
                region: "Europe".to_string(),
                delivery_method: "EXW".to_string(),
                cost_eur: 0.0,
            },
        ];
        let mut settings = BTreeMap::new();
        settings.insert(Settings::EUR_TO_USD.to_string(), serde_json::json!(1.18));

        Catalog {
            base_models: Table::from_rows(platforms, |p| p.model_name.clone()).unwrap(),
            options: Table::from_rows(options, |o| o.sku_id.clone()).unwrap(),
            shipping: Table::from_rows(shipping, |s| shipping_key(&s.region, &s.delivery_method))
                .unwrap(),
            settings: Settings::new(settings),
            ..Catalog::default()
        }
    }

    fn request(currency: Currency, options: &[(&str, u32)]) -> QuoteRequest {
        QuoteRequest {
            model_name: "NuvaSpan S2".to_string(),
            currency,
            region: "Europe".to_string(),
            delivery_method: "DAP".to_string(),
            option_quantities: options
                .iter()
                .map(|(sku, qty)| (sku.to_string(), *qty))
                .collect(),
        }
    }

    #[test]
    fn usd_quote_converts_every_component() {
        let quote = price_quote(&catalog(), &request(Currency::Usd, &[("SKU-BAT", 2)]), "ALL")
            .unwrap();

        assert_relative_eq!(quote.base_price, 59_000.0, epsilon = 1e-6);
        assert_relative_eq!(quote.option_subtotal(), 2_360.0, epsilon = 1e-6);
        assert_relative_eq!(quote.shipping_cost, 590.0, epsilon = 1e-6);
        assert_relative_eq!(quote.grand_total, 1.18 * 52_500.0, epsilon = 1e-6);
        assert_eq!(quote.symbol(), "$");
    }

    #[test]
    fn euro_quote_matches_list_prices() {
        let quote = price_quote(
            &catalog(),
            &request(Currency::Eur, &[("SKU-BAT", 2), ("SKU-BRG", 1)]),
            "ALL",
        )
        .unwrap();

        assert_eq!(quote.exchange_rate, 1.0);
        assert_eq!(quote.grand_total, 50_000.0 + 2_000.0 + 2_500.0 + 500.0);
        let names: Vec<_> = quote.lines.iter().map(|line| line.name.as_str()).collect();
        assert_eq!(names, ["Spare battery", "Row bridge kit"]);
    }

    #[test]
    fn zero_quantities_are_left_off_the_quote() {
        let quote = price_quote(
            &catalog(),
            &request(Currency::Eur, &[("SKU-BAT", 0), ("SKU-BRG", 0)]),
            "ALL",
        )
        .unwrap();
        assert!(quote.lines.is_empty());
        assert_eq!(quote.grand_total, 50_500.0);
    }

    #[test]
    fn option_for_another_platform_is_rejected() {
        let mut req = request(Currency::Eur, &[("SKU-BRG", 1)]);
        req.model_name = "NuvaTrack T1".to_string();
        assert_eq!(
            price_quote(&catalog(), &req, "ALL").unwrap_err(),
            CalcError::UnknownOption {
                sku: "SKU-BRG".to_string(),
                model: "NuvaTrack T1".to_string(),
            }
        );
    }

    #[test]
    fn lookup_misses_surface_as_errors() {
        let mut req = request(Currency::Eur, &[]);
        req.model_name = "Ghost".to_string();
        assert_eq!(
            price_quote(&catalog(), &req, "ALL").unwrap_err(),
            CalcError::UnknownModel("Ghost".to_string())
        );

        let mut req = request(Currency::Eur, &[]);
        req.region = "Antarctica".to_string();
        assert_eq!(
            price_quote(&catalog(), &req, "ALL").unwrap_err(),
            CalcError::UnknownRegion("Antarctica".to_string())
        );

        let mut req = request(Currency::Eur, &[]);
        req.delivery_method = "CIF".to_string();
        assert!(matches!(
            price_quote(&catalog(), &req, "ALL"),
            Err(CalcError::UnknownShippingMethod { .. })
        ));
    }

    #[test]
    fn free_shipping_is_flagged() {
        let mut req = request(Currency::Usd, &[]);
        req.delivery_method = "EXW".to_string();
        let quote = price_quote(&catalog(), &req, "ALL").unwrap();
        assert!(quote.has_free_shipping());
    }

    #[test]
    fn document_carries_reference_and_logistics_line() {
        let quote = price_quote(&catalog(), &request(Currency::Eur, &[("SKU-BAT", 3)]), "ALL")
            .unwrap();
        let document = QuoteDocument::from_quote(&quote, datetime!(2026-03-04 09:07 UTC))
            .unwrap()
            .unwrap();

        assert_eq!(document.reference, "REF: 202603040907");
        assert_eq!(document.issue_date, "2026-03-04");
        assert_eq!(document.file_name, "Cleanuva_Quote_NuvaSpan S2_20260304.pdf");
        assert_eq!(document.currency_symbol, "€");
        assert_eq!(document.lines.len(), 2);
        assert_eq!(document.lines[0].subtotal, 3_000.0);
        assert_eq!(document.lines[1].description, "Logistics Charge (DAP)");
        assert_eq!(document.grand_total, 53_500.0);
        assert!(document.exchange_note.ends_with("1 EUR = 1.18 USD"));
    }

    #[test]
    fn empty_quote_has_no_document() {
        let mut quote = price_quote(&catalog(), &request(Currency::Eur, &[]), "ALL").unwrap();
        quote.base_price = 0.0;
        quote.shipping_cost = 0.0;
        quote.grand_total = 0.0;
        assert_eq!(QuoteDocument::from_quote(&quote, OffsetDateTime::UNIX_EPOCH), Ok(None));
    }
}
