use std::path::Path;

use log::info;
use tch::{CModule, Tensor};

use crate::error::Result;
use crate::timer::Timer;

/// Forward pass of a classification model.
pub trait Engine: Send + Sync {
    /// Unnormalised class scores, `NxC`, for an `Nx3x224x224` batch.
    fn forward(&self, input: &Tensor) -> Result<Tensor>;
}

/// A TorchScript module (`torch.jit.save` output) held in evaluation mode.
pub struct TorchScriptModel {
    module: CModule,
}

impl TorchScriptModel {
    pub fn load(path: &Path) -> Result<Self> {
        let mut t = Timer::new_start("Loading TorchScript module");

        let mut module = CModule::load(path)?;
        module.set_eval();

        t.stop();
        info!("Loaded model from {}", path.display());

        Ok(TorchScriptModel { module })
    }
}

impl Engine for TorchScriptModel {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        Ok(tch::no_grad(|| self.module.forward_ts(&[input]))?)
    }
}
