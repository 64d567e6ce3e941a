pub mod conversion;

pub use conversion::{
    ConversionForm, ConversionOutcome, ConversionRequest, ConversionResponse, ConversionService,
    ConvertedFile, FormatField, RawFile,
};
