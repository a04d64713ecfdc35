// libs/appointment-cell/src/services/pricing.rs
//
// Price resolution for a consultation. The billing currency follows the
// patient's country; the service's price table is consulted in that currency
// first, then in the USD reference entry, and finally the base price is used
// as-is. Prices are carried unrounded; rounding happens once, on the doctor's
// commissioned share.
use shared_models::records::SpecialtyService;

/// Billing currency for a patient country (ISO 3166-1 alpha-2).
pub fn currency_for_country(country: &str) -> &'static str {
    match country {
        "EG" => "EGP",
        "SA" => "SAR",
        "AE" => "AED",
        "KW" => "KWD",
        "GB" => "GBP",
        "DE" | "FR" | "ES" | "IT" | "NL" => "EUR",
        _ => "USD",
    }
}

/// Resolve the price a patient pays for a service in the given currency.
/// Returns the amount together with the currency actually charged, which may
/// differ from the requested one when only a fallback entry exists.
pub fn resolve_price(service: &SpecialtyService, currency: &str) -> (f64, String) {
    if let Some(price) = service.prices_by_currency.get(currency) {
        return (*price, currency.to_string());
    }

    if let Some(price) = service.prices_by_currency.get("USD") {
        return (*price, "USD".to_string());
    }

    (service.base_price, "USD".to_string())
}

/// Round to 2 decimal places, half away from zero.
pub fn round_half_up(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
