//! Generator for seller/buyer invoices.
//!
//! Layout: a two-cell party header, an `Items:` heading, then a four-column
//! item table whose bold header repeats on every page.

use log::debug;

use super::common::{derive_file_name, format_number};
use super::engine::PdfRenderEngine;
use super::layout::{Cell, Table};
use super::traits::{Generator, Validator};
use super::validation::{validate_parties, ValidationErrors};
use super::{GeneratedDocument, GeneratorError};
use crate::invoice::models::{InvoiceData, LineItem};

const ITEM_COLUMNS: [&str; 4] = ["Item", "Quantity", "Rate", "Amount"];

impl Validator for InvoiceData {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_parties(&self.seller, &self.buyer, &mut errors);
        errors.into_result()
    }
}

/// Stateless generator for invoice PDFs.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvoiceGenerator;

impl InvoiceGenerator {
    pub fn new() -> Self {
        Self
    }

    fn party_table(invoice: &InvoiceData) -> Result<Table, GeneratorError> {
        let mut table = Table::new(&[1.0, 1.0]);
        table.push_row(vec![
            Cell::new()
                .bold_line(format!("Seller: {}", invoice.seller))
                .line(format!("GSTIN: {}", invoice.seller_gstin))
                .line(format!("Address: {}", invoice.seller_address)),
            Cell::new()
                .bold_line(format!("Buyer: {}", invoice.buyer))
                .line(format!("GSTIN: {}", invoice.buyer_gstin))
                .line(format!("Address: {}", invoice.buyer_address)),
        ])?;
        Ok(table)
    }

    fn items_table(items: &[LineItem]) -> Result<Table, GeneratorError> {
        let header = ITEM_COLUMNS.iter().map(|title| Cell::bold(*title)).collect();
        let mut table = Table::new(&[1.0; 4]).with_header(header)?;

        for item in items {
            table.push_row(vec![
                Cell::text(item.name.as_str()),
                Cell::text(item.quantity.as_str()),
                Cell::text(format_number(item.rate)),
                Cell::text(format_number(item.amount)),
            ])?;
        }
        Ok(table)
    }
}

impl Generator<InvoiceData> for InvoiceGenerator {
    fn generate(&self, invoice: &InvoiceData) -> Result<GeneratedDocument, GeneratorError> {
        let items = invoice.items.as_deref().ok_or(GeneratorError::MissingItems)?;
        let filename = derive_file_name(&invoice.seller, &invoice.buyer);

        let mut engine = PdfRenderEngine::new(&format!("Invoice {}", filename))?;
        engine.table(&Self::party_table(invoice)?);
        engine.paragraph("\nItems:", true);
        engine.table(&Self::items_table(items)?);

        debug!(
            "Rendered invoice '{}' with {} item(s) on {} page(s)",
            filename,
            items.len(),
            engine.page_count()
        );

        Ok(GeneratedDocument {
            filename,
            pdf: engine.finish()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_invoice(items: Option<Vec<LineItem>>) -> InvoiceData {
        InvoiceData {
            seller: "XYZ Pvt. Ltd.".to_string(),
            seller_gstin: "27AAAAA0000A1Z5".to_string(),
            seller_address: "12 Market Road, Pune".to_string(),
            buyer: "Vedant Computers".to_string(),
            buyer_gstin: "27BBBBB1111B1Z6".to_string(),
            buyer_address: "4 Station Lane, Mumbai".to_string(),
            items,
        }
    }

    fn widget() -> LineItem {
        LineItem {
            name: "Widget".to_string(),
            quantity: "5".to_string(),
            rate: 10.0,
            amount: 50.0,
        }
    }

    #[test]
    fn test_generate_renders_pdf() {
        let document = InvoiceGenerator::new()
            .generate(&sample_invoice(Some(vec![widget()])))
            .unwrap();
        assert_eq!(document.filename, "XYZ_Pvt._Ltd._Vedant_Computers.pdf");
        assert!(document.pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_generate_with_empty_items_still_renders() {
        let document = InvoiceGenerator::new()
            .generate(&sample_invoice(Some(Vec::new())))
            .unwrap();
        assert!(!document.pdf.is_empty());
    }

    #[test]
    fn test_generate_without_items_fails() {
        let result = InvoiceGenerator::new().generate(&sample_invoice(None));
        assert!(matches!(result, Err(GeneratorError::MissingItems)));
    }

    #[test]
    fn test_items_table_has_row_per_item() {
        let table = InvoiceGenerator::items_table(&[widget(), widget(), widget()]).unwrap();
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.rows()[0][2].lines[0].text, "10.0");
        assert!(table.header().unwrap().iter().all(|c| c.lines[0].bold));
    }

    #[test]
    fn test_party_table_emphasizes_names() {
        let table = InvoiceGenerator::party_table(&sample_invoice(None)).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row[0].lines[0].text, "Seller: XYZ Pvt. Ltd.");
        assert!(row[0].lines[0].bold);
        assert_eq!(row[1].lines[2].text, "Address: 4 Station Lane, Mumbai");
        assert!(!row[1].lines[2].bold);
    }

    #[test]
    fn test_validate_rejects_unsafe_names() {
        let mut invoice = sample_invoice(None);
        invoice.buyer = "../secrets".to_string();
        assert!(invoice.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_missing_items() {
        assert!(sample_invoice(None).validate().is_ok());
    }
}
