// Copyright (c) 2023 The MobileCoin Foundation

#![allow(dead_code)]

#[path = "../../src/test_support.rs"]
mod test_support;

use server_trust_evaluator::{
    AuthType, Certificate, CertificateChain, StandardValidator, ValidationFailure,
};

pub(crate) use test_support::{at, self_signed, Authority, ScriptedValidator, DAY, NOW, YEAR};

pub fn ecdsa() -> AuthType {
    AuthType::new("ECDSA")
}
