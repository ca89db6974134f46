use crate::domain::model::{Planogram, Position};
use crate::utils::error::Result;
use csv::WriterBuilder;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LayoutFormat {
    #[default]
    Csv,
    Tsv,
}

impl LayoutFormat {
    fn delimiter(self) -> u8 {
        match self {
            LayoutFormat::Csv => b',',
            LayoutFormat::Tsv => b'\t',
        }
    }
}

impl FromStr for LayoutFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(LayoutFormat::Csv),
            "tsv" => Ok(LayoutFormat::Tsv),
            other => Err(format!("unsupported format '{}', expected csv or tsv", other)),
        }
    }
}

fn write_rows(format: LayoutFormat, rows: Vec<Vec<String>>) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(&row)?;
    }
    let data = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}

/// Shelf view: one line per grid row, each cell holds the occupying product's name.
pub fn layout_table(planogram: &Planogram, format: LayoutFormat) -> Result<String> {
    let names: HashMap<_, _> = planogram
        .products
        .iter()
        .map(|p| (&p.id, p.name.as_str()))
        .collect();
    let occupancy = planogram.occupancy();
    let grid = planogram.grid_size;

    let mut rows = Vec::with_capacity(grid.rows as usize + 1);
    let mut header = vec!["row".to_string()];
    header.extend((0..grid.cols).map(|col| format!("c{}", col)));
    rows.push(header);

    for row in 0..grid.rows {
        let mut line = Vec::with_capacity(grid.cols as usize + 1);
        line.push(row.to_string());
        for col in 0..grid.cols {
            let cell = occupancy
                .occupant(Position::new(row, col))
                .and_then(|id| names.get(id).copied())
                .unwrap_or_default();
            line.push(cell.to_string());
        }
        rows.push(line);
    }

    write_rows(format, rows)
}

/// Product list with pricing, facings and `row:col` positions joined by `;`.
pub fn product_sheet(planogram: &Planogram, format: LayoutFormat) -> Result<String> {
    let mut rows = vec![["id", "name", "mrp", "gp", "facings", "positions"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>()];

    for product in &planogram.products {
        let positions = product
            .positions
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(";");
        rows.push(vec![
            product.id.to_string(),
            product.name.clone(),
            product.mrp.to_string(),
            product.gp.to_string(),
            product.facings.to_string(),
            positions,
        ]);
    }

    write_rows(format, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::CategoryId;
    use crate::domain::model::{GridSize, NewProduct};

    fn sample() -> Planogram {
        let mut planogram =
            Planogram::new(CategoryId::from("cat"), GridSize::new(2, 3)).unwrap();
        planogram
            .add_product(NewProduct {
                name: "Soap, bar".to_string(),
                mrp: 50.0,
                gp: 20.0,
                facings: 2,
                positions: vec![Position::new(0, 0), Position::new(1, 2)],
            })
            .unwrap();
        planogram
    }

    #[test]
    fn test_layout_table_csv() {
        let table = layout_table(&sample(), LayoutFormat::Csv).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "row,c0,c1,c2");
        assert_eq!(lines[1], "0,\"Soap, bar\",,");
        assert_eq!(lines[2], "1,,,\"Soap, bar\"");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_product_sheet_tsv() {
        let planogram = sample();
        let sheet = product_sheet(&planogram, LayoutFormat::Tsv).unwrap();
        let lines: Vec<&str> = sheet.lines().collect();
        assert_eq!(lines[0], "id\tname\tmrp\tgp\tfacings\tpositions");
        let expected = format!("{}\tSoap, bar\t50\t20\t2\t0:0;1:2", planogram.products[0].id);
        assert_eq!(lines[1], expected);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("TSV".parse::<LayoutFormat>().unwrap(), LayoutFormat::Tsv);
        assert!("xlsx".parse::<LayoutFormat>().is_err());
    }
}
