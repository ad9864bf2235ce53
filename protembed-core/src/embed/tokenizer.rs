use crate::error::{ProtError, ProtResult};
use ndarray::Array2;
use std::path::Path;
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer};

/// Pretrained tokenizer loaded from a `tokenizer.json` artifact.
///
/// Whatever padding the artifact declares, the strategy is forced to
/// batch-longest so every encode pads to the longest sequence of the batch.
pub struct SeqTokenizer {
    inner: Tokenizer,
}

impl SeqTokenizer {
    pub fn from_file(path: impl AsRef<Path>) -> ProtResult<Self> {
        let inner = Tokenizer::from_file(path.as_ref()).map_err(tokenizer_err)?;
        tracing::info!(path = %path.as_ref().display(), "tokenizer loaded");
        Ok(Self::with_longest_padding(inner))
    }

    pub fn from_bytes(bytes: &[u8]) -> ProtResult<Self> {
        let inner = Tokenizer::from_bytes(bytes).map_err(tokenizer_err)?;
        Ok(Self::with_longest_padding(inner))
    }

    fn with_longest_padding(mut inner: Tokenizer) -> Self {
        let mut params: PaddingParams = inner.get_padding().cloned().unwrap_or_default();
        params.strategy = PaddingStrategy::BatchLongest;
        inner.with_padding(Some(params));
        Self { inner }
    }

    /// Encode a batch with model-specific special tokens, padded to the
    /// longest sequence.
    pub fn encode_batch(&self, inputs: &[String]) -> ProtResult<TokenBatch> {
        if inputs.is_empty() {
            return Err(ProtError::EmptyBatch);
        }
        let encodings = self
            .inner
            .encode_batch(inputs.to_vec(), true)
            .map_err(tokenizer_err)?;
        TokenBatch::from_encodings(&encodings)
    }
}

fn tokenizer_err(err: tokenizers::Error) -> ProtError {
    ProtError::Tokenizer {
        msg: err.to_string(),
    }
}

/// Padded token matrices ready for the encoder. Rows are sequences in
/// input order, columns are token positions.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
}

impl TokenBatch {
    pub fn new(input_ids: Array2<i64>, attention_mask: Array2<i64>) -> ProtResult<Self> {
        if input_ids.dim() != attention_mask.dim() {
            let (ir, ic) = input_ids.dim();
            let (mr, mc) = attention_mask.dim();
            return Err(ProtError::TokenShapeMismatch {
                ids_shape: [ir, ic],
                mask_shape: [mr, mc],
            });
        }
        Ok(Self {
            input_ids,
            attention_mask,
        })
    }

    pub(crate) fn from_encodings(encodings: &[Encoding]) -> ProtResult<Self> {
        if encodings.is_empty() {
            return Err(ProtError::EmptyBatch);
        }
        let rows = encodings.len();
        let cols = encodings[0].get_ids().len();

        let mut input_ids = Array2::<i64>::zeros((rows, cols));
        let mut attention_mask = Array2::<i64>::zeros((rows, cols));

        for (row, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            if ids.len() != cols || mask.len() != cols {
                return Err(ProtError::Tokenizer {
                    msg: format!(
                        "ragged batch after padding (row {row}: {} tokens, expected {cols})",
                        ids.len()
                    ),
                });
            }
            for (col, &id) in ids.iter().enumerate() {
                input_ids[[row, col]] = i64::from(id);
            }
            for (col, &m) in mask.iter().enumerate() {
                attention_mask[[row, col]] = i64::from(m);
            }
        }

        Ok(Self {
            input_ids,
            attention_mask,
        })
    }

    pub fn input_ids(&self) -> &Array2<i64> {
        &self.input_ids
    }

    pub fn attention_mask(&self) -> &Array2<i64> {
        &self.attention_mask
    }

    pub fn n_sequences(&self) -> usize {
        self.input_ids.nrows()
    }

    /// Padded width of the batch.
    pub fn seq_len(&self) -> usize {
        self.input_ids.ncols()
    }

    /// Unpadded token count of row `i` (special tokens included).
    pub fn token_count(&self, i: usize) -> usize {
        self.attention_mask
            .row(i)
            .iter()
            .map(|&m| m as usize)
            .sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::array;

    // Minimal WordLevel tokenizer over amino-acid tokens with a trailing
    // </s>, mirroring the T5-style artifacts this crate consumes.
    pub(crate) fn test_tokenizer_json() -> String {
        let aa = "ACDEFGHIKLMNPQRSTVWYX";
        let mut vocab = String::from("\"<pad>\": 0, \"</s>\": 1, \"<unk>\": 2");
        for (i, ch) in aa.chars().enumerate() {
            vocab.push_str(&format!(", \"{ch}\": {}", i + 3));
        }
        format!(
            r#"{{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [
    {{"id": 0, "content": "<pad>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}},
    {{"id": 1, "content": "</s>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}},
    {{"id": 2, "content": "<unk>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}}
  ],
  "normalizer": null,
  "pre_tokenizer": {{"type": "Whitespace"}},
  "post_processor": {{
    "type": "TemplateProcessing",
    "single": [
      {{"Sequence": {{"id": "A", "type_id": 0}}}},
      {{"SpecialToken": {{"id": "</s>", "type_id": 0}}}}
    ],
    "pair": [
      {{"Sequence": {{"id": "A", "type_id": 0}}}},
      {{"SpecialToken": {{"id": "</s>", "type_id": 0}}}},
      {{"Sequence": {{"id": "B", "type_id": 0}}}},
      {{"SpecialToken": {{"id": "</s>", "type_id": 0}}}}
    ],
    "special_tokens": {{
      "</s>": {{"id": "</s>", "ids": [1], "tokens": ["</s>"]}}
    }}
  }},
  "decoder": null,
  "model": {{"type": "WordLevel", "vocab": {{{vocab}}}, "unk_token": "<unk>"}}
}}"#
        )
    }

    pub(crate) fn test_tokenizer() -> SeqTokenizer {
        SeqTokenizer::from_bytes(test_tokenizer_json().as_bytes()).unwrap()
    }

    #[test]
    fn batch_pads_to_longest_and_appends_eos() {
        let tokenizer = test_tokenizer();
        let batch = tokenizer
            .encode_batch(&["M K V".to_string(), "M K".to_string()])
            .unwrap();

        // A=3 C=4 D=5 E=6 F=7 G=8 H=9 I=10 K=11 L=12 M=13 ... V=20
        assert_eq!(batch.n_sequences(), 2);
        assert_eq!(batch.seq_len(), 4);
        assert_eq!(
            batch.input_ids(),
            &array![[13i64, 11, 20, 1], [13, 11, 1, 0]]
        );
        assert_eq!(
            batch.attention_mask(),
            &array![[1i64, 1, 1, 1], [1, 1, 1, 0]]
        );
        assert_eq!(batch.token_count(0), 4);
        assert_eq!(batch.token_count(1), 3);
    }

    #[test]
    fn unknown_residue_maps_to_unk() {
        let tokenizer = test_tokenizer();
        let batch = tokenizer.encode_batch(&["M B".to_string()]).unwrap();
        assert_eq!(batch.input_ids(), &array![[13i64, 2, 1]]);
    }

    #[test]
    fn empty_input_rejected() {
        let tokenizer = test_tokenizer();
        let err = tokenizer.encode_batch(&[]).unwrap_err();
        assert!(matches!(err, ProtError::EmptyBatch));
    }

    #[test]
    fn token_batch_shape_check() {
        let err = TokenBatch::new(
            Array2::<i64>::zeros((2, 3)),
            Array2::<i64>::zeros((2, 4)),
        )
        .unwrap_err();
        assert!(matches!(err, ProtError::TokenShapeMismatch { .. }));
    }
}
