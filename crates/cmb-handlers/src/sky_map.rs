//! Mapas del cielo HEALPix.
//!
//! En disco, un mapa es un `ArrayData` de forma `(n_fields, npix)` codificado
//! con bincode detrás de una cabecera mágica. En memoria, las etapas trabajan
//! con `SkyMap`, que envuelve un `ndarray::Array2<f64>` y garantiza que
//! `npix = 12 * nside^2`.

use std::fs;
use std::path::Path;

use cmb_core::{ArrayData, AssetData, AssetPayload, Handler, HandlerError};
use ndarray::{Array2, ArrayView1, Axis};

const MAGIC: &[u8; 8] = b"CMBMAP1\0";

/// Mayor `nside` que admite la pixelización HEALPix.
pub const MAX_NSIDE: u32 = 1 << 29;

/// Número de píxeles de un mapa HEALPix de resolución `nside`; `None` si
/// `nside` excede `MAX_NSIDE` o el conteo no cabe en `usize`.
pub fn nside_to_npix(nside: u32) -> Option<usize> {
    if nside > MAX_NSIDE {
        return None;
    }
    let nside = usize::try_from(nside).ok()?;
    nside.checked_mul(nside)?.checked_mul(12)
}

/// Inversa de `nside_to_npix`; `None` si `npix` no es un tamaño HEALPix.
pub fn npix_to_nside(npix: usize) -> Option<u32> {
    if npix == 0 || npix % 12 != 0 {
        return None;
    }
    let n = npix / 12;
    let nside = (n as f64).sqrt().round() as usize;
    (nside * nside == n).then_some(nside as u32)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SkyMapHandler;

impl Handler for SkyMapHandler {
    fn read(&self, path: &Path) -> Result<AssetData, HandlerError> {
        let bytes = fs::read(path)?;
        let body = bytes.strip_prefix(MAGIC.as_slice())
                        .ok_or_else(|| HandlerError::Decode(format!("{} is not a sky map file", path.display())))?;
        let raw: ArrayData = bincode::deserialize(body).map_err(|e| HandlerError::Decode(e.to_string()))?;
        // bincode no pasa por el constructor: se revalida la forma.
        let (shape, values) = raw.into_parts();
        Ok(AssetData::Array(ArrayData::new(shape, values)?))
    }

    fn write(&self, path: &Path, data: &AssetData) -> Result<(), HandlerError> {
        let array = data.as_array()?;
        let mut bytes = MAGIC.to_vec();
        bytes.extend(bincode::serialize(array).map_err(|e| HandlerError::Encode(e.to_string()))?);
        fs::write(path, bytes)?;
        Ok(())
    }
}

/// Mapa con uno o más campos (p. ej. I, Q, U) sobre la misma pixelización.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyMap {
    nside: u32,
    fields: Array2<f64>,
}

impl SkyMap {
    /// `fields` tiene forma `(n_fields, npix)`.
    pub fn new(fields: Array2<f64>) -> Result<Self, HandlerError> {
        let npix = fields.ncols();
        let nside = npix_to_nside(npix).ok_or_else(|| HandlerError::Invalid(format!("{npix} pixels is not a valid HEALPix size")))?;
        if fields.nrows() == 0 {
            return Err(HandlerError::Invalid("sky map needs at least one field".into()));
        }
        Ok(Self { nside, fields })
    }

    pub fn from_fn(nside: u32, n_fields: usize, f: impl Fn(usize, usize) -> f64) -> Result<Self, HandlerError> {
        let npix = nside_to_npix(nside).ok_or_else(|| HandlerError::Invalid(format!("nside {nside} is out of range")))?;
        Self::new(Array2::from_shape_fn((n_fields, npix), |(field, pix)| f(field, pix)))
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    pub fn npix(&self) -> usize {
        self.fields.ncols()
    }

    pub fn n_fields(&self) -> usize {
        self.fields.nrows()
    }

    pub fn fields(&self) -> &Array2<f64> {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.n_fields()).then(|| self.fields.index_axis(Axis(0), index))
    }

    /// Aplica `f` a cada campo, conservando la pixelización.
    pub fn map_fields(&self, mut f: impl FnMut(usize, ArrayView1<'_, f64>) -> Vec<f64>) -> Result<Self, HandlerError> {
        let mut out = Array2::zeros(self.fields.raw_dim());
        for (i, row) in self.fields.outer_iter().enumerate() {
            let values = f(i, row);
            if values.len() != self.npix() {
                return Err(HandlerError::Shape { shape: vec![self.npix()], len: values.len() });
            }
            out.row_mut(i).iter_mut().zip(values).for_each(|(dst, v)| *dst = v);
        }
        Ok(Self { nside: self.nside, fields: out })
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.fields
    }
}

impl AssetPayload for SkyMap {
    fn into_data(self) -> Result<AssetData, HandlerError> {
        let shape = vec![self.fields.nrows(), self.fields.ncols()];
        let values: Vec<f64> = self.fields.iter().copied().collect();
        Ok(AssetData::Array(ArrayData::new(shape, values)?))
    }

    fn from_data(data: AssetData) -> Result<Self, HandlerError> {
        let array = match data {
            AssetData::Array(a) => a,
            other => return Err(HandlerError::WrongData { expected: "array", found: other.kind() }),
        };
        let (shape, values) = array.into_parts();
        let (rows, cols) = match shape.as_slice() {
            [npix] => (1, *npix),
            [rows, cols] => (*rows, *cols),
            _ => return Err(HandlerError::Shape { shape, len: values.len() }),
        };
        let fields = Array2::from_shape_vec((rows, cols), values).map_err(|e| HandlerError::Invalid(e.to_string()))?;
        Self::new(fields)
    }
}
