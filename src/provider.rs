use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::types::{BlockHeader, Coin as PublicCoin, CoinState as PublicCoinState, PuzzleSolution};
use crate::{
    AddressCodec, Bech32mAddressCodec, BincodeCodec, ClientConfig, Codec, Error,
    Filter, Message, MessageChannel, MessageManager, ProtocolMessageTypes, RegisterForCoinUpdates,
    RegisterForPhUpdates, RejectAdditionsRequest, RejectHeaderBlocks, RejectHeaderRequest,
    RejectPuzzleSolution, RejectRemovalsRequest, RequestAdditions, RequestBlockHeader,
    RequestChildren, RequestHeaderBlocks, RequestPuzzleSolution, RequestRemovals,
    RespondAdditions, RespondBlockHeader, RespondChildren, RespondHeaderBlocks,
    RespondPuzzleSolution, RespondRemovals, RespondToCoinUpdates, RespondToPhUpdates, Result,
    WireMessage,
};

/// The typed query facade: each public operation builds a protocol request,
/// registers a filter whose predicate matches the expected response(s),
/// awaits it, and translates the result to `crate::types`. Grounded on
/// `chia_client::Client`'s own request methods
/// (`send_request`, `register_for_ph_updates`, ...), replacing their
/// id-based `RequestMap::request` with `MessageManager::register_filter`.
pub struct Provider<C: AddressCodec = Bech32mAddressCodec> {
    manager: MessageManager,
    config: ClientConfig,
    address_codec: C,
}

impl Provider<Bech32mAddressCodec> {
    pub fn new(channel: Arc<dyn MessageChannel>, config: ClientConfig) -> Self {
        Self {
            manager: MessageManager::new(channel),
            config,
            address_codec: Bech32mAddressCodec,
        }
    }
}

impl<C: AddressCodec> Provider<C> {
    pub fn with_address_codec(channel: Arc<dyn MessageChannel>, config: ClientConfig, address_codec: C) -> Self {
        Self {
            manager: MessageManager::new(channel),
            config,
            address_codec,
        }
    }

    pub async fn initialize(&self) -> Result<()> {
        self.manager.initialize().await
    }

    pub async fn close(&self) {
        self.manager.close().await;
    }

    pub fn get_network_id(&self) -> &str {
        &self.config.network_id
    }

    /// §4.3.1: reads the cached peak, never sends a frame.
    pub fn get_block_number(&self) -> Option<u64> {
        self.manager.peak_height()
    }

    /// §4.3.2. Registering interest has a side effect on the server (future
    /// `coin_state_update`s will be pushed) even though this call reads once;
    /// that's the underlying protocol's tradeoff, not a bug here.
    pub async fn get_balance(
        &self,
        address: Option<&str>,
        puzzle_hash_hex: Option<&str>,
        min_height: u32,
    ) -> Result<Option<u128>> {
        let Some(puzzle_hash) = self.derive_puzzle_hash(address, puzzle_hash_hex) else {
            return Ok(None);
        };

        let request = RegisterForPhUpdates {
            puzzle_hashes: vec![puzzle_hash],
            min_height,
        };
        let response = self
            .request::<_, RespondToPhUpdates>(request, move |message| {
                message.msg_type == ProtocolMessageTypes::RespondToPhUpdates
                    && decode_ok::<RespondToPhUpdates>(message)
                        .is_some_and(|r| r.puzzle_hashes.contains(&puzzle_hash))
            })
            .await?;

        let balance = response
            .coin_states
            .iter()
            .filter(|state| state.coin.puzzle_hash == puzzle_hash && state.spent_height.is_none())
            .map(|state| u128::from(state.coin.amount))
            .sum();

        Ok(Some(balance))
    }

    /// §4.3.3. Returns a channel rather than invoking a user callback
    /// in-line, per the "Callback-based subscriptions" redesign note — the
    /// predicate only has to push, never to run caller code, so dispatch
    /// can never be blocked or re-entered by it.
    pub async fn subscribe_to_puzzle_hash_updates(
        &self,
        puzzle_hashes: Vec<[u8; 32]>,
        min_height: u32,
    ) -> Result<mpsc::UnboundedReceiver<Vec<PublicCoinState>>> {
        let tracked: HashSet<[u8; 32]> = puzzle_hashes.iter().copied().collect();
        let (sender, receiver) = mpsc::unbounded_channel();

        let message = Message::new(
            RegisterForPhUpdates::msg_type(),
            BincodeCodec::encode(&RegisterForPhUpdates {
                puzzle_hashes,
                min_height,
            })?,
        );

        let filter = Filter::subscription(Some(message), move |message: &Message| {
            if message.msg_type != ProtocolMessageTypes::RespondToPhUpdates {
                return false;
            }
            let Some(response) = decode_ok::<RespondToPhUpdates>(message) else {
                return false;
            };
            if !response.puzzle_hashes.iter().any(|ph| tracked.contains(ph)) {
                return false;
            }
            let matched: Vec<PublicCoinState> = response
                .coin_states
                .into_iter()
                .filter(|state| tracked.contains(&state.coin.puzzle_hash))
                .map(Into::into)
                .collect();
            let _ = sender.send(matched);
            true
        });

        self.manager.register_filter(filter).await?;
        Ok(receiver)
    }

    /// §4.3.3, coin-id variant.
    pub async fn subscribe_to_coin_updates(
        &self,
        coin_ids: Vec<[u8; 32]>,
        min_height: u32,
    ) -> Result<mpsc::UnboundedReceiver<Vec<PublicCoinState>>> {
        let tracked: HashSet<[u8; 32]> = coin_ids.iter().copied().collect();
        let (sender, receiver) = mpsc::unbounded_channel();

        let message = Message::new(
            RegisterForCoinUpdates::msg_type(),
            BincodeCodec::encode(&RegisterForCoinUpdates {
                coin_ids,
                min_height,
            })?,
        );

        let filter = Filter::subscription(Some(message), move |message: &Message| {
            if message.msg_type != ProtocolMessageTypes::RespondToCoinUpdates {
                return false;
            }
            let Some(response) = decode_ok::<RespondToCoinUpdates>(message) else {
                return false;
            };
            let matched: Vec<PublicCoinState> = response
                .coin_states
                .into_iter()
                .filter(|state| tracked.contains(&state.coin.coin_id()))
                .map(Into::into)
                .collect();
            if matched.is_empty() {
                return false;
            }
            let _ = sender.send(matched);
            true
        });

        self.manager.register_filter(filter).await?;
        Ok(receiver)
    }

    /// §4.3.4.
    pub async fn get_puzzle_solution(
        &self,
        coin_id: [u8; 32],
        height: u32,
    ) -> Result<Option<PuzzleSolution>> {
        let request = RequestPuzzleSolution {
            coin_name: coin_id,
            height,
        };
        let message = self.send_and_await(request, move |message: &Message| match message.msg_type
        {
            ProtocolMessageTypes::RespondPuzzleSolution => {
                decode_ok::<RespondPuzzleSolution>(message)
                    .is_some_and(|r| r.coin_name == coin_id && r.height == height)
            }
            ProtocolMessageTypes::RejectPuzzleSolution => {
                decode_ok::<RejectPuzzleSolution>(message)
                    .is_some_and(|r| r.coin_name == coin_id && r.height == height)
            }
            _ => false,
        })
        .await?;

        match message.msg_type {
            ProtocolMessageTypes::RespondPuzzleSolution => {
                let response: RespondPuzzleSolution = decode(&message)?;
                Ok(Some(PuzzleSolution {
                    coin_name: response.coin_name,
                    height: u64::from(response.height),
                    puzzle_reveal: response.puzzle_reveal,
                    solution: response.solution,
                }))
            }
            _ => Ok(None),
        }
    }

    /// §4.3.5. Preserves the source's ambiguous "empty or first-parent-match"
    /// acceptance rule rather than re-deriving stricter semantics.
    pub async fn get_coin_children(&self, coin_name: [u8; 32]) -> Result<Vec<PublicCoinState>> {
        let request = RequestChildren { coin_name };
        let message = self
            .send_and_await(request, move |message: &Message| {
                message.msg_type == ProtocolMessageTypes::RespondChildren
                    && decode_ok::<RespondChildren>(message).is_some_and(|r| {
                        r.coin_states.is_empty()
                            || r.coin_states[0].coin.parent_coin_info == coin_name
                    })
            })
            .await?;

        let response: RespondChildren = decode(&message)?;
        Ok(response.coin_states.into_iter().map(Into::into).collect())
    }

    /// §4.3.6.
    pub async fn get_block_header(&self, height: u32) -> Result<Option<BlockHeader>> {
        let request = RequestBlockHeader { height };
        let message = self
            .send_and_await(request, move |message: &Message| match message.msg_type {
                ProtocolMessageTypes::RespondBlockHeader => {
                    decode_ok::<RespondBlockHeader>(message)
                        .is_some_and(|r| r.header_block.height() == height)
                }
                ProtocolMessageTypes::RejectHeaderRequest => {
                    decode_ok::<RejectHeaderRequest>(message).is_some_and(|r| r.height == height)
                }
                _ => false,
            })
            .await?;

        match message.msg_type {
            ProtocolMessageTypes::RespondBlockHeader => {
                let response: RespondBlockHeader = decode(&message)?;
                Ok(Some(response.header_block.into()))
            }
            _ => Ok(None),
        }
    }

    /// §4.3.7.
    pub async fn get_blocks_headers(
        &self,
        start_height: u32,
        end_height: u32,
    ) -> Result<Option<Vec<BlockHeader>>> {
        let request = RequestHeaderBlocks {
            start_height,
            end_height,
        };
        let message = self
            .send_and_await(request, move |message: &Message| match message.msg_type {
                ProtocolMessageTypes::RespondHeaderBlocks => {
                    decode_ok::<RespondHeaderBlocks>(message).is_some_and(|r| {
                        r.start_height == start_height && r.end_height == end_height
                    })
                }
                ProtocolMessageTypes::RejectHeaderBlocks => {
                    decode_ok::<RejectHeaderBlocks>(message).is_some_and(|r| {
                        r.start_height == start_height && r.end_height == end_height
                    })
                }
                _ => false,
            })
            .await?;

        match message.msg_type {
            ProtocolMessageTypes::RespondHeaderBlocks => {
                let response: RespondHeaderBlocks = decode(&message)?;
                Ok(Some(
                    response.header_blocks.into_iter().map(Into::into).collect(),
                ))
            }
            _ => Ok(None),
        }
    }

    /// §4.3.8, removals variant. Validates every hex coin-id before sending;
    /// any invalid value yields `Ok(None)` without a frame going out.
    pub async fn get_coin_removals(
        &self,
        height: u32,
        header_hash: [u8; 32],
        coin_names: Option<&[String]>,
    ) -> Result<Option<Vec<PublicCoin>>> {
        let coin_names = match coin_names {
            Some(names) => match self.parse_hex_hashes(names) {
                Some(parsed) => Some(parsed),
                None => return Ok(None),
            },
            None => None,
        };

        let request = RequestRemovals {
            height,
            header_hash,
            coin_names,
        };
        let message = self
            .send_and_await(request, move |message: &Message| match message.msg_type {
                ProtocolMessageTypes::RespondRemovals => decode_ok::<RespondRemovals>(message)
                    .is_some_and(|r| r.height == height && r.header_hash == header_hash),
                ProtocolMessageTypes::RejectRemovalsRequest => {
                    decode_ok::<RejectRemovalsRequest>(message)
                        .is_some_and(|r| r.height == height && r.header_hash == header_hash)
                }
                _ => false,
            })
            .await?;

        match message.msg_type {
            ProtocolMessageTypes::RespondRemovals => {
                let response: RespondRemovals = decode(&message)?;
                Ok(Some(
                    response
                        .coins
                        .into_iter()
                        .filter_map(|(_, coin)| coin)
                        .map(Into::into)
                        .collect(),
                ))
            }
            _ => Ok(None),
        }
    }

    /// §4.3.8, additions variant.
    pub async fn get_coin_additions(
        &self,
        height: u32,
        header_hash: [u8; 32],
        puzzle_hashes: Option<&[String]>,
    ) -> Result<Option<Vec<PublicCoin>>> {
        let puzzle_hashes = match puzzle_hashes {
            Some(hashes) => match self.parse_hex_hashes(hashes) {
                Some(parsed) => Some(parsed),
                None => return Ok(None),
            },
            None => None,
        };

        let request = RequestAdditions {
            height,
            header_hash,
            puzzle_hashes,
        };
        let message = self
            .send_and_await(request, move |message: &Message| match message.msg_type {
                ProtocolMessageTypes::RespondAdditions => decode_ok::<RespondAdditions>(message)
                    .is_some_and(|r| r.height == height && r.header_hash == header_hash),
                ProtocolMessageTypes::RejectAdditionsRequest => {
                    decode_ok::<RejectAdditionsRequest>(message)
                        .is_some_and(|r| r.height == height && r.header_hash == header_hash)
                }
                _ => false,
            })
            .await?;

        match message.msg_type {
            ProtocolMessageTypes::RespondAdditions => {
                let response: RespondAdditions = decode(&message)?;
                Ok(Some(
                    response
                        .coins
                        .into_iter()
                        .flat_map(|(_, coins)| coins)
                        .map(Into::into)
                        .collect(),
                ))
            }
            _ => Ok(None),
        }
    }

    /// §4.3.9: the Leaflet provider never holds keys, so these are a
    /// contract failure, not a missing feature.
    pub fn get_address(&self) -> Result<String> {
        Err(Error::UnsupportedOperation)
    }

    pub fn transfer(&self) -> Result<()> {
        Err(Error::UnsupportedOperation)
    }

    pub fn transfer_cat(&self) -> Result<()> {
        Err(Error::UnsupportedOperation)
    }

    pub fn accept_offer(&self) -> Result<()> {
        Err(Error::UnsupportedOperation)
    }

    pub fn subscribe_to_address_changes(&self) -> Result<()> {
        Err(Error::UnsupportedOperation)
    }

    fn derive_puzzle_hash(&self, address: Option<&str>, puzzle_hash_hex: Option<&str>) -> Option<[u8; 32]> {
        let hrp = self.config.network().address_hrp;
        if let Some(address) = address {
            if address.starts_with(hrp.as_str()) {
                return self.address_codec.decode_address(address, &hrp);
            }
        }
        puzzle_hash_hex.and_then(|hex_str| self.address_codec.decode_puzzle_hash_hex(hex_str))
    }

    fn parse_hex_hashes(&self, hashes: &[String]) -> Option<Vec<[u8; 32]>> {
        hashes
            .iter()
            .map(|hash| self.address_codec.decode_puzzle_hash_hex(hash))
            .collect()
    }

    /// Sends `request` once, registers a one-shot filter for `predicate`,
    /// and awaits the raw matching `Message` for callers that need to branch
    /// on which response variant arrived.
    async fn send_and_await<Req: WireMessage>(
        &self,
        request: Req,
        predicate: impl FnMut(&Message) -> bool + Send + 'static,
    ) -> Result<Message> {
        let message = Message::new(Req::msg_type(), BincodeCodec::encode(&request)?);
        let (filter, receiver) = Filter::one_shot(Some(message), predicate);
        self.manager.register_filter(filter).await?;
        receiver.await?
    }

    /// Like `send_and_await`, but decodes the single expected response type
    /// directly — for operations with exactly one success shape.
    async fn request<Req: WireMessage, Resp>(
        &self,
        request: Req,
        predicate: impl FnMut(&Message) -> bool + Send + 'static,
    ) -> Result<Resp>
    where
        Resp: serde::Serialize + serde::de::DeserializeOwned + WireMessage,
    {
        let message = self.send_and_await(request, predicate).await?;
        decode(&message)
    }
}

fn decode<T: serde::Serialize + serde::de::DeserializeOwned + WireMessage>(
    message: &Message,
) -> Result<T> {
    BincodeCodec::decode(&message.data).map_err(|_| Error::Decode(message.msg_type))
}

fn decode_ok<T: serde::Serialize + serde::de::DeserializeOwned>(message: &Message) -> Option<T> {
    BincodeCodec::decode(&message.data).ok()
}
