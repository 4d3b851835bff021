#[cfg(test)]
mod compilation;
#[cfg(test)]
mod matching;
#[cfg(test)]
mod properties;
