use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";

/// Creates a random alphanumeric string of the given length.
///
/// Used for the opaque tokens that are mailed out in confirm / cancel links,
/// so it uses the thread local CSPRNG.
pub fn create_random_secret(secret_len: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..secret_len)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
