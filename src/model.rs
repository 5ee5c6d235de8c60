use serde::{de::DeserializeOwned, Deserialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
#[cfg(feature = "torch")]
use tch::{kind::Kind, CModule, Device, Tensor};

use crate::encoder::{self, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::error::{FareError, LoadError, PredictionError};

/// Sidecar for TorchScript artifacts: feature ordering and input width.
#[cfg(feature = "torch")]
#[derive(Deserialize)]
struct MetaJson {
    feat_list: Vec<String>,
    in_dim: Option<usize>,
}

/// Linear regression as exported by the training pipeline.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub feat_list: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub version: Option<String>,
}

impl LinearModel {
    fn score(&self, x: &[f32]) -> f64 {
        self.coefficients
            .iter()
            .zip(x)
            .map(|(w, v)| w * f64::from(*v))
            .sum::<f64>()
            + self.intercept
    }
}

#[cfg(feature = "torch")]
struct TorchModel {
    module: CModule,
    device: Device,
}

#[cfg(feature = "torch")]
impl TorchModel {
    fn load(path: &Path) -> Result<(Self, Vec<String>), LoadError> {
        let device = Device::Cpu;

        let meta: MetaJson = read_json(&path.with_file_name("meta.json"))?;
        if let Some(in_dim) = meta.in_dim {
            if in_dim != meta.feat_list.len() {
                return Err(LoadError::Incompatible(format!(
                    "meta.in_dim ({}) != feat_list.len() ({})",
                    in_dim,
                    meta.feat_list.len()
                )));
            }
        }

        let module = CModule::load_on_device(path, device).map_err(|source| LoadError::Torch {
            path: path.to_path_buf(),
            source,
        })?;

        Ok((Self { module, device }, meta.feat_list))
    }

    fn score(&self, x: &[f32]) -> Result<f64, PredictionError> {
        let input = Tensor::from_slice(x)
            .reshape([1, x.len() as i64])
            .to_device(self.device);

        // Expect a single regression output: [1] or [1, 1].
        let out = self.module.forward_ts(&[input])?.to_kind(Kind::Double);
        let sz = out.size();
        if sz.iter().product::<i64>() != 1 {
            return Err(PredictionError::OutputShape(sz));
        }
        Ok(out.reshape([-1]).f_double_value(&[0])?)
    }
}

enum Backend {
    Linear(LinearModel),
    #[cfg(feature = "torch")]
    Torch(TorchModel),
}

/// Fare and the vector it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub fare: f64,
    pub features: FeatureVector,
}

/// Handle to the loaded model. Build it once at startup and share it
/// (`Arc`) with every request; it is never mutated after `load`.
pub struct PredictionService {
    backend: Backend,
    feat_list: Vec<String>,
    version: Option<String>,
}

impl PredictionService {
    /// Load the artifact at `path`. `.pt`/`.ts` files are TorchScript (with a
    /// sibling `meta.json`); anything else is read as a JSON linear model.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::Missing {
                path: path.to_path_buf(),
            });
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let svc = match ext {
            "pt" | "ts" => Self::load_torch(path)?,
            _ => Self::from_linear(read_json(path)?)?,
        };

        tracing::info!(
            "loaded model {} (version={}); feat_list[{}]",
            path.display(),
            svc.version.as_deref().unwrap_or("unversioned"),
            svc.feat_list.len()
        );
        Ok(svc)
    }

    pub fn from_linear(model: LinearModel) -> Result<Self, LoadError> {
        if model.coefficients.len() != model.feat_list.len() {
            return Err(LoadError::Incompatible(format!(
                "{} coefficients for {} features",
                model.coefficients.len(),
                model.feat_list.len()
            )));
        }
        check_schema(&model.feat_list)?;

        let svc = Self {
            feat_list: model.feat_list.clone(),
            version: model.version.clone(),
            backend: Backend::Linear(model),
        };
        svc.warmup()?;
        Ok(svc)
    }

    #[cfg(feature = "torch")]
    fn load_torch(path: &Path) -> Result<Self, LoadError> {
        let (model, feat_list) = TorchModel::load(path)?;
        check_schema(&feat_list)?;

        let svc = Self {
            backend: Backend::Torch(model),
            feat_list,
            version: None,
        };
        svc.warmup()?;
        Ok(svc)
    }

    #[cfg(not(feature = "torch"))]
    fn load_torch(path: &Path) -> Result<Self, LoadError> {
        Err(LoadError::Unsupported {
            path: path.to_path_buf(),
            reason: "TorchScript models need the `torch` feature".to_string(),
        })
    }

    fn warmup(&self) -> Result<(), PredictionError> {
        self.predict_raw(&vec![0.0; self.in_dim()])?;
        tracing::debug!("warmup forward ok");
        Ok(())
    }

    pub fn in_dim(&self) -> usize {
        self.feat_list.len()
    }

    /// Column names in the order the model consumes them.
    pub fn feat_list(&self) -> &[String] {
        &self.feat_list
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Score a positional vector. Only its length is checked; the model does
    /// not know column names. Negative outputs are clamped to zero.
    pub fn predict_raw(&self, x: &[f32]) -> Result<f64, PredictionError> {
        if x.len() != self.in_dim() {
            return Err(PredictionError::FeatureCount {
                got: x.len(),
                expected: self.in_dim(),
            });
        }

        let raw = match &self.backend {
            Backend::Linear(m) => m.score(x),
            #[cfg(feature = "torch")]
            Backend::Torch(m) => m.score(x)?,
        };
        if !raw.is_finite() {
            return Err(PredictionError::NonFinite(raw));
        }
        if raw < 0.0 {
            tracing::debug!("clamping negative fare {:.3} to 0", raw);
        }
        Ok(raw.max(0.0))
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        self.predict_raw(&features.to_vec())
    }

    /// Encode then score.
    pub fn estimate(
        &self,
        timestamp: &str,
        distance_km: f64,
        passenger_count: i64,
    ) -> Result<Estimate, FareError> {
        let features = encoder::encode(timestamp, distance_km, passenger_count)?;
        let fare = self.predict(&features)?;
        Ok(Estimate { fare, features })
    }
}

/// The artifact must list exactly the encoder's columns, in the same order.
fn check_schema(feat_list: &[String]) -> Result<(), LoadError> {
    if feat_list.len() != FEATURE_COUNT {
        return Err(LoadError::Incompatible(format!(
            "model expects {} features, encoder produces {}",
            feat_list.len(),
            FEATURE_COUNT
        )));
    }
    for (i, (got, want)) in feat_list.iter().zip(FEATURE_NAMES).enumerate() {
        if got != want {
            return Err(LoadError::Incompatible(format!(
                "column {i} is `{got}` in the model but `{want}` in the encoder"
            )));
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let txt = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    serde_json::from_str(&txt).map_err(|source| LoadError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn io_error(path: &Path, source: io::Error) -> LoadError {
    let path: PathBuf = path.to_path_buf();
    if source.kind() == io::ErrorKind::NotFound {
        LoadError::Missing { path }
    } else {
        LoadError::Io { path, source }
    }
}
