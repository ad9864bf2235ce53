use crate::embed::tokenizer::TokenBatch;
use crate::error::{ProtError, ProtResult};
use ndarray::{Array3, Ix3};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// ONNX Runtime session over a pretrained encoder export.
///
/// The graph is expected to take `input_ids` and `attention_mask` and
/// produce `last_hidden_state` of shape `[batch, tokens, hidden]` as its
/// first output. Inference only; weights are never touched.
pub struct SeqEncoder {
    session: Session,
}

impl SeqEncoder {
    pub fn from_file(model_path: impl AsRef<Path>) -> ProtResult<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path.as_ref())?;
        tracing::info!(path = %model_path.as_ref().display(), "encoder session loaded");
        Ok(Self { session })
    }

    /// Run the encoder over a token batch and return the final hidden state.
    pub fn encode(&mut self, batch: &TokenBatch) -> ProtResult<Array3<f32>> {
        let input_ids = Tensor::from_array(batch.input_ids().to_owned())?;
        let attention_mask = Tensor::from_array(batch.attention_mask().to_owned())?;

        let hidden = {
            let outputs = self.session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])?;

            outputs[0].try_extract_array::<f32>()?.to_owned()
            // `outputs` (and the mutable borrow on session) is dropped here
        };

        let shape = hidden.shape().to_vec();
        let hidden = hidden.into_dimensionality::<Ix3>().map_err(|_| {
            ProtError::EncoderOutput {
                msg: format!("expected rank-3 last_hidden_state, got shape {shape:?}"),
            }
        })?;

        if hidden.shape()[0] != batch.n_sequences() || hidden.shape()[1] != batch.seq_len() {
            return Err(ProtError::EncoderOutput {
                msg: format!(
                    "hidden state {:?} does not match token batch [{}, {}]",
                    hidden.shape(),
                    batch.n_sequences(),
                    batch.seq_len()
                ),
            });
        }

        Ok(hidden)
    }
}
