#![no_main]

use complua_syntax::lexer::Lexer;
use complua_syntax::token::Token;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The lexer must never panic on any input — errors are fine, panics are bugs.
    let mut lexer = Lexer::new(data);
    loop {
        match lexer.advance() {
            Ok(tok) => {
                if tok.token == Token::Eof {
                    break;
                }
            }
            Err(_) => break,
        }
    }
});
