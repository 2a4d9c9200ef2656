//! Tablas de referencia por banda (frecuencia central, FWHM del beam, ...).
//!
//! Formato: texto separado por espacios. Las líneas vacías y las que empiezan
//! con `#` se ignoran; la primera línea restante es la cabecera y la primera
//! columna es la clave de cada fila.

use std::fs;
use std::path::Path;

use cmb_core::{AssetData, Handler, HandlerError, Table};

/// Handler de sólo lectura para tablas de bandas.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandTableHandler;

impl BandTableHandler {
    pub fn parse(text: &str) -> Result<Table, HandlerError> {
        let mut lines = text.lines()
                            .enumerate()
                            .map(|(i, l)| (i + 1, l.trim()))
                            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (_, header) = lines.next().ok_or_else(|| HandlerError::Invalid("band table is empty".into()))?;
        let columns: Vec<String> = header.split_whitespace().map(str::to_string).collect();
        let mut table = Table::new(columns)?;

        for (line, row) in lines {
            let cells: Vec<String> = row.split_whitespace().map(str::to_string).collect();
            table.insert_row(cells).map_err(|e| HandlerError::Parse { line, reason: e.to_string() })?;
        }
        Ok(table)
    }
}

impl Handler for BandTableHandler {
    fn read(&self, path: &Path) -> Result<AssetData, HandlerError> {
        let text = fs::read_to_string(path)?;
        Ok(AssetData::Table(Self::parse(&text)?))
    }

    fn supports_write(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANCK: &str = "\
# Planck HFI/LFI
band  center  fwhm

30    28.4    32.29
100   100     9.66
  # comentario intermedio
143   143     7.27
";

    #[test]
    fn parses_header_and_rows() {
        let table = BandTableHandler::parse(PLANCK).unwrap();
        assert_eq!(table.columns(), ["band", "center", "fwhm"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get_f64("30", "fwhm"), Some(32.29));
        assert_eq!(table.get("143", "center"), Some("143"));
    }

    #[test]
    fn reports_line_of_bad_row() {
        let err = BandTableHandler::parse("band fwhm\n100 9.66\n143\n").unwrap_err();
        assert!(matches!(err, HandlerError::Parse { line: 3, .. }));
    }

    #[test]
    fn empty_file_is_invalid() {
        assert!(matches!(BandTableHandler::parse("# nada\n\n"), Err(HandlerError::Invalid(_))));
    }

    #[test]
    fn write_is_not_supported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bands.txt");
        assert!(!BandTableHandler.supports_write());
        let err = BandTableHandler.write(&path, &AssetData::Text("x".into())).unwrap_err();
        assert!(matches!(err, HandlerError::Unsupported("write")));
        assert!(!path.exists());
    }
}
