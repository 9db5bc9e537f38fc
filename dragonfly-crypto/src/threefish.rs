//! Threefish-512: a 512-bit tweakable block cipher, 72 rounds.
//!
//! Two key-schedule strategies are exposed as concrete types rather than a
//! runtime switch, since schedule storage dominates the cipher-context
//! size: `Stored` precomputes all 19 subkeys once per rekey, `OnDemand`
//! recomputes each subkey from borrowed key/tweak buffers as it's needed.

pub const BLOCK_BYTES: usize = 64;
pub const BLOCK_WORDS: usize = 8;
pub const EXTERNAL_KEY_WORDS: usize = 9;
pub const EXTERNAL_TWEAK_WORDS: usize = 3;
pub const NUM_ROUNDS: usize = 72;
pub const NUM_SUBKEYS: usize = 19;

pub type ExternalKey = [u64; EXTERNAL_KEY_WORDS];
pub type ExternalTweak = [u64; EXTERNAL_TWEAK_WORDS];
pub type State = [u64; BLOCK_WORDS];

const C240: u64 = 0x1BD1_1BDA_A9FC_1A22;

/// Skein specification's 512-bit rotation-constant table, `R[round mod 8][mix index]`.
const ROTATION: [[u32; 4]; 8] = [
    [46, 36, 19, 37],
    [33, 27, 14, 42],
    [17, 49, 36, 39],
    [44, 9, 54, 56],
    [39, 30, 34, 24],
    [13, 50, 10, 17],
    [25, 29, 39, 43],
    [8, 35, 56, 22],
];

/// Word-permutation applied after the four MIX operations of each round:
/// new[0..8] = old[2,1,4,7,6,5,0,3].
const PERMUTE_SRC: [usize; 8] = [2, 1, 4, 7, 6, 5, 0, 3];

pub fn fill_parity_key(key_buf: &mut ExternalKey) {
    let mut p = C240;
    for k in &key_buf[..8] {
        p ^= k;
    }
    key_buf[8] = p;
}

pub fn fill_parity_tweak(tweak_buf: &mut ExternalTweak) {
    tweak_buf[2] = tweak_buf[0] ^ tweak_buf[1];
}

fn subkey_word(key_buf: &ExternalKey, tweak_buf: &ExternalTweak, i: usize, j: usize) -> u64 {
    let base = key_buf[(i + j) % EXTERNAL_KEY_WORDS];
    let extra = match j {
        5 => tweak_buf[i % 3],
        6 => tweak_buf[(i + 1) % 3],
        7 => i as u64,
        _ => 0,
    };
    base.wrapping_add(extra)
}

fn compute_subkey(key_buf: &ExternalKey, tweak_buf: &ExternalTweak, i: usize) -> State {
    let mut sk = [0u64; BLOCK_WORDS];
    for (j, word) in sk.iter_mut().enumerate() {
        *word = subkey_word(key_buf, tweak_buf, i, j);
    }
    sk
}

/// A source of the 19 round subkeys, selected at construction time.
pub trait KeySchedule {
    fn subkey(&self, i: usize) -> State;
}

/// Precomputes and stores all 19 subkeys at `rekey` time.
pub struct Stored {
    subkeys: [State; NUM_SUBKEYS],
}

impl Stored {
    pub fn rekey(mut key_buf: ExternalKey, mut tweak_buf: ExternalTweak) -> Self {
        fill_parity_key(&mut key_buf);
        fill_parity_tweak(&mut tweak_buf);
        let mut subkeys = [[0u64; BLOCK_WORDS]; NUM_SUBKEYS];
        for (i, sk) in subkeys.iter_mut().enumerate() {
            *sk = compute_subkey(&key_buf, &tweak_buf, i);
        }
        Stored { subkeys }
    }
}

impl KeySchedule for Stored {
    fn subkey(&self, i: usize) -> State {
        self.subkeys[i]
    }
}

/// Recomputes each subkey on demand from key/tweak buffers borrowed for the
/// life of the cipher context. The caller keeps the buffers alive.
pub struct OnDemand<'a> {
    key_buf: &'a ExternalKey,
    tweak_buf: &'a ExternalTweak,
}

impl<'a> OnDemand<'a> {
    pub fn rekey(key_buf: &'a mut ExternalKey, tweak_buf: &'a mut ExternalTweak) -> Self {
        fill_parity_key(key_buf);
        fill_parity_tweak(tweak_buf);
        OnDemand {
            key_buf,
            tweak_buf,
        }
    }
}

impl<'a> KeySchedule for OnDemand<'a> {
    fn subkey(&self, i: usize) -> State {
        compute_subkey(self.key_buf, self.tweak_buf, i)
    }
}

fn add_subkey(state: &mut State, sk: &State) {
    for (s, k) in state.iter_mut().zip(sk.iter()) {
        *s = s.wrapping_add(*k);
    }
}

fn subtract_subkey(state: &mut State, sk: &State) {
    for (s, k) in state.iter_mut().zip(sk.iter()) {
        *s = s.wrapping_sub(*k);
    }
}

fn mix(x0: u64, x1: u64, r: u32) -> (u64, u64) {
    let x0 = x0.wrapping_add(x1);
    let x1 = x1.rotate_left(r) ^ x0;
    (x0, x1)
}

fn inverse_mix(x0: u64, x1: u64, r: u32) -> (u64, u64) {
    let t = x1 ^ x0;
    let x1 = t.rotate_right(r);
    let x0 = x0.wrapping_sub(x1);
    (x0, x1)
}

fn mix_round(state: &mut State, round: usize) {
    let r = &ROTATION[round % 8];
    for j in 0..4 {
        let (a, b) = mix(state[2 * j], state[2 * j + 1], r[j]);
        state[2 * j] = a;
        state[2 * j + 1] = b;
    }
}

fn inverse_mix_round(state: &mut State, round: usize) {
    let r = &ROTATION[round % 8];
    for j in 0..4 {
        let (a, b) = inverse_mix(state[2 * j], state[2 * j + 1], r[j]);
        state[2 * j] = a;
        state[2 * j + 1] = b;
    }
}

fn permute(state: &mut State) {
    let old = *state;
    for (dst, &src) in PERMUTE_SRC.iter().enumerate() {
        state[dst] = old[src];
    }
}

fn inverse_permute(state: &mut State) {
    let new = *state;
    let mut old = [0u64; BLOCK_WORDS];
    for (i, &src) in PERMUTE_SRC.iter().enumerate() {
        old[src] = new[i];
    }
    *state = old;
}

fn bytes_to_state(bytes: &[u8; BLOCK_BYTES]) -> State {
    let mut state = [0u64; BLOCK_WORDS];
    for (word, chunk) in state.iter_mut().zip(bytes.chunks_exact(8)) {
        *word = u64::from_le_bytes(chunk.try_into().unwrap());
    }
    state
}

fn state_to_bytes(state: &State, out: &mut [u8; BLOCK_BYTES]) {
    for (word, chunk) in state.iter().zip(out.chunks_exact_mut(8)) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

pub fn cipher(ks: &impl KeySchedule, out: &mut [u8; BLOCK_BYTES], input: &[u8; BLOCK_BYTES]) {
    let mut state = bytes_to_state(input);
    add_subkey(&mut state, &ks.subkey(0));
    for round in 0..NUM_ROUNDS {
        mix_round(&mut state, round);
        permute(&mut state);
        if (round + 1) % 4 == 0 {
            add_subkey(&mut state, &ks.subkey((round + 1) / 4));
        }
    }
    state_to_bytes(&state, out);
}

pub fn inverse_cipher(ks: &impl KeySchedule, out: &mut [u8; BLOCK_BYTES], input: &[u8; BLOCK_BYTES]) {
    let mut state = bytes_to_state(input);
    subtract_subkey(&mut state, &ks.subkey(NUM_SUBKEYS - 1));
    for i in (0..NUM_SUBKEYS - 1).rev() {
        for round in (4 * i..4 * i + 4).rev() {
            inverse_permute(&mut state);
            inverse_mix_round(&mut state, round);
        }
        subtract_subkey(&mut state, &ks.subkey(i));
    }
    state_to_bytes(&state, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(key_buf: ExternalKey, tweak_buf: ExternalTweak, plaintext: [u8; 64]) -> [u8; 64] {
        let ks = Stored::rekey(key_buf, tweak_buf);
        let mut ct = [0u8; 64];
        cipher(&ks, &mut ct, &plaintext);
        ct
    }

    #[test]
    fn all_zero_vector() {
        let ct = run([0u64; 9], [0u64; 3], [0u8; 64]);
        let expected: [u8; 64] = [
            0xb1, 0xa2, 0xbb, 0xc6, 0xef, 0x60, 0x25, 0xbc, 0x40, 0xeb, 0x38, 0x22, 0x16, 0x1f,
            0x36, 0xe3, 0x75, 0xd1, 0xbb, 0x0a, 0xee, 0x31, 0x86, 0xfb, 0xd1, 0x9e, 0x47, 0xc5,
            0xd4, 0x79, 0x94, 0x7b, 0x7b, 0xc2, 0xf8, 0x58, 0x6e, 0x35, 0xf0, 0xcf, 0xf7, 0xe7,
            0xf0, 0x30, 0x84, 0xb0, 0xb7, 0xb1, 0xf1, 0xab, 0x39, 0x61, 0xa5, 0x80, 0xa3, 0xe9,
            0x7e, 0xb4, 0x1e, 0xa1, 0x4a, 0x6d, 0x7b, 0xbe,
        ];
        assert_eq!(ct, expected);
    }

    #[test]
    fn increasing_vector() {
        let mut key_words = [0u64; 9];
        let mut kb = [0u8; 64];
        for (i, b) in kb.iter_mut().enumerate() {
            *b = 0x10 + i as u8;
        }
        for (w, chunk) in key_words[..8].iter_mut().zip(kb.chunks_exact(8)) {
            *w = u64::from_le_bytes(chunk.try_into().unwrap());
        }

        let mut tweak_words = [0u64; 3];
        let mut tb = [0u8; 16];
        for (i, b) in tb.iter_mut().enumerate() {
            *b = i as u8;
        }
        for (w, chunk) in tweak_words[..2].iter_mut().zip(tb.chunks_exact(8)) {
            *w = u64::from_le_bytes(chunk.try_into().unwrap());
        }

        let mut plaintext = [0u8; 64];
        for (i, b) in plaintext.iter_mut().enumerate() {
            *b = 0xff - i as u8;
        }

        let ct = run(key_words, tweak_words, plaintext);
        let expected: [u8; 64] = [
            0xe3, 0x04, 0x43, 0x96, 0x26, 0xd4, 0x5a, 0x2c, 0xb4, 0x01, 0xca, 0xd8, 0xd6, 0x36,
            0x24, 0x9a, 0x63, 0x38, 0x33, 0x0e, 0xb0, 0x6d, 0x45, 0xdd, 0x8b, 0x36, 0xb9, 0x0e,
            0x97, 0x25, 0x47, 0x79, 0x27, 0x2a, 0x0a, 0x8d, 0x99, 0x46, 0x35, 0x04, 0x78, 0x44,
            0x20, 0xea, 0x18, 0xc9, 0xa7, 0x25, 0xaf, 0x11, 0xdf, 0xfe, 0xa1, 0x01, 0x62, 0x34,
            0x89, 0x27, 0x67, 0x3d, 0x5c, 0x1c, 0xaf, 0x3d,
        ];
        assert_eq!(ct, expected);
    }

    #[test]
    fn roundtrip_is_identity() {
        let mut key_buf = [0u64; 9];
        for (i, k) in key_buf[..8].iter_mut().enumerate() {
            *k = 0x0102_0304_0506_0708u64.wrapping_mul(i as u64 + 1);
        }
        let tweak_buf = [0x1122_3344_5566_7788u64, 0x99aa_bbcc_ddee_ff00u64, 0];
        let mut plaintext = [0u8; 64];
        for (i, b) in plaintext.iter_mut().enumerate() {
            *b = i as u8;
        }

        let ks = Stored::rekey(key_buf, tweak_buf);
        let mut ct = [0u8; 64];
        cipher(&ks, &mut ct, &plaintext);
        let mut pt2 = [0u8; 64];
        inverse_cipher(&ks, &mut pt2, &ct);
        assert_eq!(pt2, plaintext);

        let mut tweak_buf2 = tweak_buf;
        let ondemand = OnDemand::rekey(&mut key_buf, &mut tweak_buf2);
        let mut ct2 = [0u8; 64];
        cipher(&ondemand, &mut ct2, &plaintext);
        assert_eq!(ct2, ct);
    }
}
