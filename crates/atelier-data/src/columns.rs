//! Column contract of the transaction table.

/// Document (sale) date.
pub const DOCUMENT_DATE: &str = "document_date";
/// Store identifier.
pub const STORE_ID: &str = "store_id";
/// Product identifier (optional).
pub const PRODUCT_ID: &str = "product_id";
/// Product family / category.
pub const PRODUCT_FAMILY: &str = "product_family";
/// Garment size.
pub const SIZE: &str = "size";
/// Signed quantity, negative for returns.
pub const SIGNED_QUANTITY: &str = "signed_quantity";
/// Monetary subtotal of the line.
pub const SUBTOTAL: &str = "subtotal";
/// List (retail) price.
pub const LIST_PRICE: &str = "list_price";
/// Unit cost.
pub const UNIT_COST: &str = "unit_cost";
/// Season label such as `I25`.
pub const SEASON_LABEL: &str = "season_label";

/// Columns every transaction table must expose.
pub const REQUIRED_COLUMNS: &[&str] = &[
    DOCUMENT_DATE,
    STORE_ID,
    PRODUCT_FAMILY,
    SIZE,
    SIGNED_QUANTITY,
    SUBTOTAL,
    LIST_PRICE,
    UNIT_COST,
    SEASON_LABEL,
];

/// Family assigned to lines exported without one.
pub const UNKNOWN_FAMILY: &str = "Sin Familia";

/// Returns the first required column missing from `present`, if any.
pub fn first_missing<'a, I, S>(present: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + 'a + ?Sized,
{
    let names: Vec<&str> = present.into_iter().map(AsRef::as_ref).collect();
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .find(|required| !names.contains(required))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_missing() {
        let all: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        assert_eq!(first_missing(&all), None);

        let partial: Vec<String> = all
            .iter()
            .filter(|c| c.as_str() != UNIT_COST)
            .cloned()
            .collect();
        assert_eq!(first_missing(&partial), Some(UNIT_COST));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let upper: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_uppercase()).collect();
        assert_eq!(first_missing(&upper), Some(DOCUMENT_DATE));
    }
}
