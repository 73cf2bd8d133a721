use std::io::{Read, Write};
use serde::{de, Deserialize};
use tokio::io::AsyncWriteExt;
use crate::codec::Codec;
use crate::error::{CResult, Error};

#[derive(Clone, Copy)]
pub struct JsonCodec {

}

impl JsonCodec {
    pub fn new() -> Self {
        JsonCodec {

        }
    }

    pub fn encode<T>(&self, value: &T) -> CResult<String>
        where T: ?Sized + serde::Serialize {

        let str = serde_json::to_string(&value);

        match str {
            Ok(serde) => {
                Ok(serde)
            }
            Err(err) => {
                Err(Error::Internal(err.to_string()))
            }
        }
    }

    pub fn decode<R>(&self, value: &String) -> CResult<R>
        where R: for<'a> de::Deserialize<'a> {

        let r: serde_json::Result<R> = serde_json::from_str(&value);
        match r {
            Ok(r) => {
                Ok(r)
            }
            Err(err) => {
                Err(Error::Parse(err.to_string()))
            }
        }
    }
}

impl Codec for JsonCodec {
    fn codec_name<T>(&self) -> String {
        "JsonCodec".to_string()
    }
}
